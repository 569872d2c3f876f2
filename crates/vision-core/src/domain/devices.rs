//! Camera device enumeration results and wrap-around selection.

use serde::{Deserialize, Serialize};

/// One video input reported by a camera provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraDevice {
    /// Stable identifier passed back as an exact `device_id` constraint.
    pub device_id: String,
    /// Human-readable name; may be empty before permission is granted.
    pub label: String,
}

impl CameraDevice {
    pub fn new(device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            label: label.into(),
        }
    }
}

/// Cycles through the available cameras.
///
/// `select_next` and `select_previous` wrap around; both are no-ops on an empty list.
#[derive(Debug, Clone, Default)]
pub struct CameraSelector {
    devices: Vec<CameraDevice>,
    index: usize,
}

impl CameraSelector {
    pub fn new(devices: Vec<CameraDevice>) -> Self {
        Self { devices, index: 0 }
    }

    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The selected device, or `None` when no camera was enumerated.
    pub fn current(&self) -> Option<&CameraDevice> {
        self.devices.get(self.index)
    }

    pub fn select_next(&mut self) -> Option<&CameraDevice> {
        if self.devices.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.devices.len();
        self.current()
    }

    pub fn select_previous(&mut self) -> Option<&CameraDevice> {
        if self.devices.is_empty() {
            return None;
        }
        let len = self.devices.len();
        self.index = (self.index + len - 1) % len;
        self.current()
    }

    /// Selects `index`; out-of-range indices are ignored and return `None`.
    pub fn set_index(&mut self, index: usize) -> Option<&CameraDevice> {
        if index >= self.devices.len() {
            return None;
        }
        self.index = index;
        self.current()
    }

    /// Replaces the device list, keeping the index when it is still in range.
    pub fn replace_devices(&mut self, devices: Vec<CameraDevice>) {
        self.devices = devices;
        if self.index >= self.devices.len() {
            self.index = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_cameras() -> CameraSelector {
        CameraSelector::new(vec![
            CameraDevice::new("a", "Front"),
            CameraDevice::new("b", "Back"),
            CameraDevice::new("c", "USB"),
        ])
    }

    #[test]
    fn test_empty_selector_has_no_current() {
        let mut selector = CameraSelector::default();
        assert!(selector.current().is_none());
        assert!(selector.select_next().is_none());
        assert!(selector.select_previous().is_none());
        assert_eq!(selector.index(), 0);
    }

    #[test]
    fn test_next_wraps_to_first() {
        let mut selector = three_cameras();
        selector.select_next();
        selector.select_next();
        let wrapped = selector.select_next().map(|d| d.device_id.clone());
        assert_eq!(wrapped.as_deref(), Some("a"));
    }

    #[test]
    fn test_previous_wraps_to_last() {
        let mut selector = three_cameras();
        let last = selector.select_previous().map(|d| d.device_id.clone());
        assert_eq!(last.as_deref(), Some("c"));
        assert_eq!(selector.index(), 2);
    }

    #[test]
    fn test_set_index_out_of_range_is_ignored() {
        let mut selector = three_cameras();
        selector.set_index(1);
        assert!(selector.set_index(7).is_none());
        assert_eq!(selector.index(), 1);
    }

    #[test]
    fn test_replace_devices_resets_stale_index() {
        let mut selector = three_cameras();
        selector.set_index(2);
        selector.replace_devices(vec![CameraDevice::new("z", "Only")]);
        assert_eq!(selector.index(), 0);
        assert_eq!(selector.current().map(|d| d.label.as_str()), Some("Only"));
    }
}
