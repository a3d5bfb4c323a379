//! Automation decision: maps a measurement and the client's ideal ranges to
//! the state every actuator should be in.
//!
//! | Metric | Below range | Within | Above range |
//! |--------|-------------|--------|-------------|
//! | temperature | light on, fan off | both off | light off, fan on |
//! | humidity | humidifier on, motor off | both off | humidifier off, motor on |

use crate::actuator::ActuatorKind;
use crate::ideal_range::{IdealRange, Position};
use crate::reading::Measurement;

/// The state one actuator should be driven to, with the reason recorded in
/// the audit trail when it actually changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesiredState {
    pub actuator: ActuatorKind,
    pub on: bool,
    pub reason: &'static str,
}

impl DesiredState {
    const fn new(actuator: ActuatorKind, on: bool, reason: &'static str) -> Self {
        Self {
            actuator,
            on,
            reason,
        }
    }
}

/// Decide all four actuator states. Pure; the order of the result is
/// light, fan, humidifier, motor.
#[must_use]
pub fn decide(
    measurement: Measurement,
    temperature: &IdealRange,
    humidity: &IdealRange,
) -> [DesiredState; 4] {
    let [light, fan] = climate(temperature.classify(measurement.temperature));
    let [humidifier, motor] = moisture(humidity.classify(measurement.humidity));
    [light, fan, humidifier, motor]
}

fn climate(position: Position) -> [DesiredState; 2] {
    use ActuatorKind::{Fan, Light};
    match position {
        Position::Below => [
            DesiredState::new(Light, true, "Temperatura baja, encendiendo luz"),
            DesiredState::new(Fan, false, "Ventilador apagado"),
        ],
        Position::Above => [
            DesiredState::new(Light, false, "Luz apagada"),
            DesiredState::new(Fan, true, "Temperatura alta, encendiendo ventilador"),
        ],
        Position::Within => [
            DesiredState::new(Light, false, "Temperatura normal, luz apagada"),
            DesiredState::new(Fan, false, "Temperatura normal, ventilador apagado"),
        ],
    }
}

fn moisture(position: Position) -> [DesiredState; 2] {
    use ActuatorKind::{Humidifier, Motor};
    match position {
        Position::Below => [
            DesiredState::new(Humidifier, true, "Humedad baja, encendiendo humidificador"),
            DesiredState::new(Motor, false, "Motor apagado"),
        ],
        Position::Above => [
            DesiredState::new(Humidifier, false, "Humidificador apagado"),
            DesiredState::new(Motor, true, "Humedad alta, encendiendo motor"),
        ],
        Position::Within => [
            DesiredState::new(Humidifier, false, "Humedad normal, humidificador apagado"),
            DesiredState::new(Motor, false, "Humedad normal, motor apagado"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientId;
    use crate::ideal_range::ParameterKind;

    fn ranges() -> (IdealRange, IdealRange) {
        let id = ClientId::new("mushroom1").unwrap();
        (
            IdealRange::new(id.clone(), ParameterKind::Temperature, 15.0, 30.0),
            IdealRange::new(id, ParameterKind::Humidity, 30.0, 100.0),
        )
    }

    fn states(temperature: f64, humidity: f64) -> [(ActuatorKind, bool); 4] {
        let (t, h) = ranges();
        decide(
            Measurement {
                temperature,
                humidity,
            },
            &t,
            &h,
        )
        .map(|d| (d.actuator, d.on))
    }

    #[test]
    fn should_turn_light_on_when_cold() {
        assert_eq!(
            states(10.0, 50.0),
            [
                (ActuatorKind::Light, true),
                (ActuatorKind::Fan, false),
                (ActuatorKind::Humidifier, false),
                (ActuatorKind::Motor, false),
            ]
        );
    }

    #[test]
    fn should_turn_fan_on_when_hot() {
        let [light, fan, ..] = states(35.0, 50.0);
        assert_eq!(light, (ActuatorKind::Light, false));
        assert_eq!(fan, (ActuatorKind::Fan, true));
    }

    #[test]
    fn should_turn_humidifier_on_when_dry() {
        let [.., humidifier, motor] = states(20.0, 10.0);
        assert_eq!(humidifier, (ActuatorKind::Humidifier, true));
        assert_eq!(motor, (ActuatorKind::Motor, false));
    }

    #[test]
    fn should_turn_motor_on_when_wet() {
        let (t, mut h) = ranges();
        h.max = 80.0;
        let [.., humidifier, motor] = decide(
            Measurement {
                temperature: 20.0,
                humidity: 95.0,
            },
            &t,
            &h,
        );
        assert!(!humidifier.on);
        assert!(motor.on);
        assert_eq!(motor.reason, "Humedad alta, encendiendo motor");
    }

    #[test]
    fn should_switch_everything_off_when_in_range() {
        assert!(states(20.0, 60.0).iter().all(|(_, on)| !on));
    }
}
