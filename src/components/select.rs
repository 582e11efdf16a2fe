use alloc::string::{String, ToString};
use alloc::vec::Vec;

use log::{debug, error, warn};

use super::{State, Writable};
use crate::entity::{Component, ControllerMode, Device, Entity, WriteError};
use crate::protocol::{MessageNumber, RawValue};

/// A closed set of labelled codes. Options keep the order they were given in.
pub struct Select {
    entity: Entity,
    state: State<String>,
    options: Vec<(String, RawValue)>,
}

impl Select {
    pub fn new<L, I, S>(
        label: L,
        message: MessageNumber,
        mode: ControllerMode,
        device: Option<Device>,
        options: I,
    ) -> Self
    where
        L: Into<String>,
        I: IntoIterator<Item = (S, RawValue)>,
        S: Into<String>,
    {
        Select {
            entity: Entity::new(label, message, mode, device),
            state: State::new(),
            options: options.into_iter().map(|(label, code)| (label.into(), code)).collect(),
        }
    }

    pub fn options(&self) -> impl Iterator<Item = &str> + '_ {
        self.options.iter().map(|(label, _)| label.as_str())
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.index_of(option).is_some()
    }

    pub fn index_of(&self, option: &str) -> Option<usize> {
        self.options.iter().position(|(label, _)| label == option)
    }

    fn code_of(&self, option: &str) -> Option<RawValue> {
        self.options.iter().find(|(label, _)| label == option).map(|(_, code)| *code)
    }

    fn option_for(&self, code: RawValue) -> Option<&str> {
        self.options.iter().find(|(_, c)| *c == code).map(|(label, _)| label.as_str())
    }

    pub fn state(&self) -> Option<String> {
        self.state.get()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.state.get().and_then(|option| self.index_of(&option))
    }

    pub fn add_on_state_callback<F: Fn(&String) + 'static>(&self, callback: F) {
        self.state.add_on_state_callback(callback);
    }

    pub fn set_option(&self, option: &str) -> Result<(), WriteError> {
        let message = self.entity.message();
        let code = match self.code_of(option) {
            Some(code) => code,
            None => {
                error!("Validation Error: '{}' is not an option of {}", option, message);
                return Err(WriteError::InvalidOption { message, option: option.to_string() });
            }
        };

        debug!("Select {} [{}] -> {} ({})", message, self.entity.label(), option, code);
        self.entity.write(code).map_err(|e| {
            error!("Select write failed: {}", e);
            e
        })
    }
}

impl Component for Select {
    fn entity(&self) -> &Entity {
        &self.entity
    }

    fn on_receive(&self, value: RawValue) {
        match self.option_for(value) {
            Some(option) => self.state.publish(option.to_string()),
            None => {
                let entity = &self.entity;
                warn!("{} [{}]: no option for code {}", entity.message(), entity.label(), value)
            }
        }
    }
}

impl Writable for Select {
    type Value = String;

    fn write_value(&self, value: String) -> Result<(), WriteError> {
        self.set_option(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::testing::*;
    use crate::protocol::MessageSet;
    use alloc::rc::Rc;

    fn fan_mode() -> Rc<Select> {
        Rc::new(Select::new(
            "ENUM_IN_FAN_MODE",
            MessageNumber(0x4006),
            ControllerMode::ReadWrite,
            None,
            vec![("Auto", 0), ("Low", 1), ("Mid", 2), ("High", 3), ("Turbo", 4)],
        ))
    }

    #[test]
    fn receive_test() {
        let select = fan_mode();
        select.on_receive(2);
        assert_eq!(Some("Mid".to_string()), select.state());
        assert_eq!(Some(2), select.active_index());

        // unknown codes leave the state alone
        select.on_receive(9);
        assert_eq!(Some("Mid".to_string()), select.state());
    }

    #[test]
    fn set_option_test() {
        let mut controller = controller();
        let select = fan_mode();
        controller.register(&select).unwrap();

        select.set_option("High").unwrap();
        let packets = sent_packets(&mut controller);
        assert_eq!(vec![MessageSet::new(MessageNumber(0x4006), 3)], packets[0].messages);
    }

    #[test]
    fn round_trip_test() {
        let mut controller = controller();
        let select = fan_mode();
        controller.register(&select).unwrap();

        select.set_option("High").unwrap();
        assert_eq!(None, select.state());

        let packets = sent_packets(&mut controller);
        assert_eq!(1, packets.len());
        controller.decode(&packets[0].to_bytes().unwrap());
        assert_eq!(Some("High".to_string()), select.state());
        assert_eq!(Some(3), select.active_index());
    }

    #[test]
    fn invalid_option_test() {
        let mut controller = controller();
        let select = fan_mode();
        controller.register(&select).unwrap();

        assert!(!select.has_option("Breeze"));
        assert_eq!(
            Err(WriteError::InvalidOption {
                message: MessageNumber(0x4006),
                option: "Breeze".to_string(),
            }),
            select.write_value("Breeze".to_string())
        );
        assert!(sent_packets(&mut controller).is_empty());
    }

    #[test]
    fn options_keep_order_test() {
        let select = fan_mode();
        let options: Vec<&str> = select.options().collect();
        assert_eq!(vec!["Auto", "Low", "Mid", "High", "Turbo"], options);
        assert_eq!(Some(4), select.index_of("Turbo"));
    }
}
