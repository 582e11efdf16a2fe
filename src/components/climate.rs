//! A thermostat view composed from the power, target temperature and current
//! temperature adapters, plus optional action sensor and preset select.
//!
//! The climate never talks to the bus directly. It listens to its parts and
//! writes through them, so each part's validation still applies.

use alloc::collections::BTreeMap;
use alloc::rc::{Rc, Weak};
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use log::{debug, warn};

use super::{Number, Select, Sensor, State, Switch};
use crate::entity::WriteError;
use crate::protocol::RawValue;
use crate::registry::ConfigError;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ClimateMode {
    Off,
    Heat,
    Cool,
    HeatCool,
    Auto,
    Dry,
    FanOnly,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ClimateAction {
    Off,
    Idle,
    Heating,
    Cooling,
    Fan,
}

/// Raw action sensor codes to actions. Each code maps once.
#[derive(Clone, Debug, Default)]
pub struct ClimateActionMap {
    mappings: BTreeMap<RawValue, ClimateAction>,
}

impl ClimateActionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (RawValue, ClimateAction)>,
    {
        let mut map = Self::new();
        for (code, action) in entries {
            map.add_map_entry(code, action)?;
        }
        Ok(map)
    }

    pub fn add_map_entry(
        &mut self,
        code: RawValue,
        action: ClimateAction,
    ) -> Result<(), ConfigError> {
        if self.mappings.contains_key(&code) {
            return Err(ConfigError::DuplicateActionCode(code));
        }
        self.mappings.insert(code, action);
        Ok(())
    }

    pub fn get(&self, code: RawValue) -> Option<ClimateAction> {
        self.mappings.get(&code).copied()
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClimateState {
    pub mode: ClimateMode,
    pub action: ClimateAction,
    pub current_temperature: Option<f32>,
    pub target_temperature: Option<f32>,
    pub custom_preset: Option<String>,
}

impl Default for ClimateState {
    fn default() -> Self {
        ClimateState {
            mode: ClimateMode::Off,
            action: ClimateAction::Off,
            current_temperature: None,
            target_temperature: None,
            custom_preset: None,
        }
    }
}

/// A change request from the host. Unset fields are left alone.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClimateCall {
    pub mode: Option<ClimateMode>,
    pub target_temperature: Option<f32>,
    pub custom_preset: Option<String>,
}

impl ClimateCall {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: ClimateMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_target_temperature(mut self, temperature: f32) -> Self {
        self.target_temperature = Some(temperature);
        self
    }

    pub fn with_custom_preset<P: Into<String>>(mut self, preset: P) -> Self {
        self.custom_preset = Some(preset.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClimateTraits {
    pub supported_modes: Vec<ClimateMode>,
    pub supports_action: bool,
    pub supports_current_temperature: bool,
    pub visual_min_temperature: f32,
    pub visual_max_temperature: f32,
    pub visual_temperature_step: f32,
    pub custom_presets: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ControlError {
    UnsupportedMode(ClimateMode),
    NoPresetSelect,
    Write(WriteError),
}

impl From<WriteError> for ControlError {
    fn from(e: WriteError) -> Self {
        ControlError::Write(e)
    }
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::UnsupportedMode(mode) => write!(f, "mode {:?} is not supported", mode),
            ControlError::NoPresetSelect => write!(f, "no preset select configured"),
            ControlError::Write(e) => fmt::Display::fmt(e, f),
        }
    }
}

pub struct Climate {
    power: Rc<Switch>,
    target_temp: Rc<Number>,
    current_temp: Rc<Sensor>,
    action_sensor: Option<(Rc<Sensor>, ClimateActionMap)>,
    custom_presets: Option<Rc<Select>>,
    on_mode: ClimateMode,
    current: RefCell<ClimateState>,
    state: State<ClimateState>,
}

impl Climate {
    pub fn new(power: Rc<Switch>, target_temp: Rc<Number>, current_temp: Rc<Sensor>) -> Self {
        Climate {
            power,
            target_temp,
            current_temp,
            action_sensor: None,
            custom_presets: None,
            on_mode: ClimateMode::Heat,
            current: RefCell::new(ClimateState::default()),
            state: State::new(),
        }
    }

    pub fn with_action_sensor(mut self, sensor: Rc<Sensor>, map: ClimateActionMap) -> Self {
        self.action_sensor = Some((sensor, map));
        self
    }

    pub fn with_custom_preset_select(mut self, select: Rc<Select>) -> Self {
        self.custom_presets = Some(select);
        self
    }

    /// The mode reported while the power switch is on.
    pub fn with_on_mode(mut self, mode: ClimateMode) -> Self {
        self.on_mode = mode;
        self
    }

    /// Subscribe to the parts and take over whatever they already hold.
    pub fn setup(self) -> Rc<Self> {
        let climate = Rc::new(self);

        let weak = Rc::downgrade(&climate);
        climate.power.add_on_state_callback(move |on| with(&weak, |c| c.on_power(*on)));
        let weak = Rc::downgrade(&climate);
        climate.target_temp.add_on_state_callback(move |t| with(&weak, |c| c.on_target_temp(*t)));
        let weak = Rc::downgrade(&climate);
        climate.current_temp.add_on_state_callback(move |t| with(&weak, |c| c.on_current_temp(*t)));
        if let Some((sensor, _)) = &climate.action_sensor {
            let weak = Rc::downgrade(&climate);
            sensor.add_on_state_callback(move |v| with(&weak, |c| c.on_action_sens(*v)));
        }
        if let Some(select) = &climate.custom_presets {
            let weak = Rc::downgrade(&climate);
            select.add_on_state_callback(move |p| with(&weak, |c| c.on_preset_select(p)));
        }

        let mut changed = climate.update_mode();
        changed |= climate.update_action();
        if let Some(t) = climate.target_temp.state() {
            changed |= climate.update_target_temp(t);
        }
        if let Some(t) = climate.current_temp.state() {
            changed |= climate.update_current_temp(t);
        }
        if let Some(preset) = climate.custom_presets.as_ref().and_then(|s| s.state()) {
            changed |= climate.update_custom_preset(&preset);
        }
        if changed {
            climate.publish();
        }
        climate
    }

    pub fn state(&self) -> Option<ClimateState> {
        self.state.get()
    }

    pub fn add_on_state_callback<F: Fn(&ClimateState) + 'static>(&self, callback: F) {
        self.state.add_on_state_callback(callback);
    }

    pub fn traits(&self) -> ClimateTraits {
        ClimateTraits {
            supported_modes: alloc::vec![ClimateMode::Off, self.on_mode],
            supports_action: self.action_sensor.is_some(),
            supports_current_temperature: true,
            visual_min_temperature: self.target_temp.min_value(),
            visual_max_temperature: self.target_temp.max_value(),
            visual_temperature_step: self.target_temp.step(),
            custom_presets: self
                .custom_presets
                .as_ref()
                .map(|s| s.options().map(ToString::to_string).collect())
                .unwrap_or_default(),
        }
    }

    /// Forward a host request to the parts. Every field is tried even if an
    /// earlier one failed. State follows once the unit reports the change.
    pub fn control(&self, call: &ClimateCall) -> Result<(), Vec<ControlError>> {
        let mut errors = Vec::new();

        if let Some(mode) = call.mode {
            let result = if mode == ClimateMode::Off {
                self.power.turn_off().map_err(ControlError::from)
            } else if mode == self.on_mode {
                self.power.turn_on().map_err(ControlError::from)
            } else {
                warn!("Climate mode {:?} not supported", mode);
                Err(ControlError::UnsupportedMode(mode))
            };
            errors.extend(result.err());
        }

        if let Some(temperature) = call.target_temperature {
            errors.extend(self.target_temp.set_value(temperature).err().map(ControlError::from));
        }

        if let Some(preset) = &call.custom_preset {
            let result = match &self.custom_presets {
                Some(select) => select.set_option(preset).map_err(ControlError::from),
                None => Err(ControlError::NoPresetSelect),
            };
            errors.extend(result.err());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn on_power(&self, on: bool) {
        debug!("Climate power {}", if on { "on" } else { "off" });
        let changed = self.update_mode() | self.update_action();
        if changed {
            self.publish();
        }
    }

    fn on_target_temp(&self, temperature: f32) {
        if self.update_target_temp(temperature) {
            self.publish();
        }
    }

    fn on_current_temp(&self, temperature: f32) {
        if self.update_current_temp(temperature) {
            self.publish();
        }
    }

    fn on_action_sens(&self, value: f32) {
        if let Some((_, map)) = &self.action_sensor {
            let code = libm::roundf(value) as RawValue;
            if map.get(code).is_none() {
                warn!("Climate action code {} is not mapped", code);
            }
        }
        if self.update_action() {
            self.publish();
        }
    }

    fn on_preset_select(&self, preset: &str) {
        if self.update_custom_preset(preset) {
            self.publish();
        }
    }

    fn mode(&self) -> ClimateMode {
        match self.power.state() {
            Some(true) => self.on_mode,
            _ => ClimateMode::Off,
        }
    }

    /// Off whenever the power is off. Otherwise the mapped action sensor
    /// value, or idle until the sensor reports a mapped code. An unmapped
    /// code keeps whatever action the unit was last seen doing.
    fn derived_action(&self) -> Option<ClimateAction> {
        if self.mode() == ClimateMode::Off {
            return Some(ClimateAction::Off);
        }
        let mapped = match &self.action_sensor {
            Some((sensor, map)) => {
                sensor.state().and_then(|v| map.get(libm::roundf(v) as RawValue))
            }
            None => None,
        };
        match mapped {
            Some(action) => Some(action),
            None if self.current.borrow().action == ClimateAction::Off => Some(ClimateAction::Idle),
            None if self.action_sensor.is_none() => Some(ClimateAction::Idle),
            None => None,
        }
    }

    fn update_mode(&self) -> bool {
        let mode = self.mode();
        let mut current = self.current.borrow_mut();
        if current.mode == mode {
            return false;
        }
        current.mode = mode;
        true
    }

    fn update_action(&self) -> bool {
        let action = match self.derived_action() {
            Some(action) => action,
            None => return false,
        };
        let mut current = self.current.borrow_mut();
        if current.action == action {
            return false;
        }
        current.action = action;
        true
    }

    fn update_current_temp(&self, temperature: f32) -> bool {
        let mut current = self.current.borrow_mut();
        if current.current_temperature == Some(temperature) {
            return false;
        }
        current.current_temperature = Some(temperature);
        true
    }

    fn update_target_temp(&self, temperature: f32) -> bool {
        let mut current = self.current.borrow_mut();
        if current.target_temperature == Some(temperature) {
            return false;
        }
        current.target_temperature = Some(temperature);
        true
    }

    fn update_custom_preset(&self, preset: &str) -> bool {
        let mut current = self.current.borrow_mut();
        if current.custom_preset.as_deref() == Some(preset) {
            return false;
        }
        current.custom_preset = Some(preset.to_string());
        true
    }

    fn publish(&self) {
        let snapshot = self.current.borrow().clone();
        self.state.publish(snapshot);
    }
}

fn with<F: FnOnce(&Climate)>(climate: &Weak<Climate>, f: F) {
    if let Some(climate) = climate.upgrade() {
        f(&climate);
    }
}
