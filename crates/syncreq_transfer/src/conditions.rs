use std::sync::atomic::{AtomicBool, Ordering};

use crate::collaborators::ConditionSensors;

/// True when an immediate retry would fail outright (no network) or be
/// throttled by the platform (device idle).
pub fn should_schedule_retry(sensors: &dyn ConditionSensors) -> bool {
    !sensors.is_network_active() || sensors.is_device_idle()
}

/// Sensor state kept up to date by platform connectivity and power callbacks.
#[derive(Debug)]
pub struct DeviceConditions {
    network_active: AtomicBool,
    device_idle: AtomicBool,
}

impl DeviceConditions {
    pub fn new(network_active: bool, device_idle: bool) -> Self {
        Self {
            network_active: AtomicBool::new(network_active),
            device_idle: AtomicBool::new(device_idle),
        }
    }

    pub fn set_network_active(&self, active: bool) {
        self.network_active.store(active, Ordering::Relaxed);
    }

    pub fn set_device_idle(&self, idle: bool) {
        self.device_idle.store(idle, Ordering::Relaxed);
    }
}

impl Default for DeviceConditions {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ConditionSensors for DeviceConditions {
    fn is_network_active(&self) -> bool {
        self.network_active.load(Ordering::Relaxed)
    }

    fn is_device_idle(&self) -> bool {
        self.device_idle.load(Ordering::Relaxed)
    }
}
