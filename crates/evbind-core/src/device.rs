//! Keyboard discovery and the evdev event source

use std::path::{Path, PathBuf};

use evdev::Device;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::error::DeviceError;
use crate::key::KeyEvent;

/// Capacity of the channel between the device reader task and the engine.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Information about an input device
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    pub path: PathBuf,
    pub name: String,
    pub vendor: u16,
    pub product: u16,
    /// Whether the device qualifies as a keyboard (see [`is_keyboard`])
    pub keyboard: bool,
}

impl DeviceInfo {
    fn from_device(path: PathBuf, device: &Device) -> Self {
        let id = device.input_id();
        Self {
            path,
            name: device.name().unwrap_or("Unknown").to_string(),
            vendor: id.vendor(),
            product: id.product(),
            keyboard: is_keyboard(device),
        }
    }

    /// Get vendor:product string (e.g., "3434:0361")
    pub fn vendor_product(&self) -> String {
        format!("{:04x}:{:04x}", self.vendor, self.product)
    }

    /// Whether `selector` names this device by path or by exact name.
    ///
    /// Path selectors are resolved first, so `/dev/input/by-id/...` and
    /// `/dev/input/by-path/...` links match the event node they point to.
    pub fn matches(&self, selector: &str) -> bool {
        let path = Path::new(selector);
        if self.path == path || self.name == selector {
            return true;
        }
        match std::fs::canonicalize(path) {
            Ok(resolved) => {
                resolved == self.path
                    || std::fs::canonicalize(&self.path).is_ok_and(|own| own == resolved)
            }
            Err(_) => false,
        }
    }
}

/// Enumerate all input devices, ordered by event node number
pub fn enumerate_devices() -> Result<Vec<DeviceInfo>, DeviceError> {
    let mut devices = Vec::new();

    for entry in std::fs::read_dir("/dev/input")? {
        let entry = entry?;
        let path = entry.path();

        if event_index(&path).is_none() {
            continue;
        }

        match Device::open(&path) {
            Ok(device) => devices.push(DeviceInfo::from_device(path, &device)),
            Err(e) => {
                tracing::debug!("Could not open {}: {}", path.display(), e);
            }
        }
    }

    devices.sort_by_key(|info| event_index(&info.path));
    Ok(devices)
}

/// Check if a device is a keyboard.
///
/// A keyboard reports key events and autorepeat, and calls itself a keyboard.
pub fn is_keyboard(device: &Device) -> bool {
    let events = device.supported_events();
    events.contains(evdev::EventType::KEY)
        && events.contains(evdev::EventType::REPEAT)
        && device.name().map(looks_like_keyboard).unwrap_or(false)
}

fn looks_like_keyboard(name: &str) -> bool {
    name.to_lowercase().contains("keyboard")
}

/// Numeric suffix of an `/dev/input/eventN` node.
fn event_index(path: &Path) -> Option<u32> {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix("event"))
        .and_then(|n| n.parse().ok())
}

/// Pick the keyboard to listen on.
///
/// Without a selector the first keyboard is used. A selector matches a
/// device path or exact device name, and does not need to be a keyboard.
pub fn find_keyboard(selector: Option<&str>) -> Result<DeviceInfo, DeviceError> {
    let devices = enumerate_devices()?;
    select_device(devices, selector)
}

fn select_device(
    devices: Vec<DeviceInfo>,
    selector: Option<&str>,
) -> Result<DeviceInfo, DeviceError> {
    match selector {
        Some(selector) => devices
            .into_iter()
            .find(|info| info.matches(selector))
            .ok_or_else(|| DeviceError::NotFound {
                selector: selector.to_string(),
            }),
        None => devices
            .into_iter()
            .find(|info| info.keyboard)
            .ok_or(DeviceError::NoKeyboard),
    }
}

/// Open the device at `path` and stream its key events.
///
/// A spawned task forwards key events in order and ends on the first read
/// error, which closes the channel. Autorepeat arrives as
/// [`EventKind::Held`](crate::EventKind::Held); non-key events are dropped.
///
/// Must be called from within a tokio runtime.
pub fn listen(path: &Path) -> Result<mpsc::Receiver<KeyEvent>, DeviceError> {
    let device = Device::open(path).map_err(|source| DeviceError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let name = device.name().unwrap_or("Unknown").to_string();
    let mut stream = device.into_event_stream()?;
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let path = path.to_path_buf();

    tracing::info!("Listening on '{}' at {}", name, path.display());

    tokio::spawn(async move {
        loop {
            match stream.next_event().await {
                Ok(event) => {
                    let Some(key_event) = KeyEvent::from_input(&event) else {
                        continue;
                    };
                    if tx.send(key_event).await.is_err() {
                        tracing::debug!("Event receiver dropped, closing {}", path.display());
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("Stopped reading {}: {}", path.display(), e);
                    break;
                }
            }
        }
    });

    Ok(rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(path: &str, name: &str, keyboard: bool) -> DeviceInfo {
        DeviceInfo {
            path: PathBuf::from(path),
            name: name.to_string(),
            vendor: 0x3434,
            product: 0x0361,
            keyboard,
        }
    }

    #[test]
    fn test_vendor_product_format() {
        let device = DeviceInfo {
            vendor: 0x1,
            product: 0xabc,
            ..info("/dev/input/event0", "kbd", true)
        };
        assert_eq!(device.vendor_product(), "0001:0abc");
    }

    #[test]
    fn test_event_index() {
        assert_eq!(event_index(Path::new("/dev/input/event3")), Some(3));
        assert_eq!(event_index(Path::new("/dev/input/event12")), Some(12));
        assert_eq!(event_index(Path::new("/dev/input/mouse0")), None);
        assert_eq!(event_index(Path::new("/dev/input/by-id")), None);
    }

    #[test]
    fn test_looks_like_keyboard() {
        assert!(looks_like_keyboard("AT Translated Set 2 keyboard"));
        assert!(looks_like_keyboard("Keychron K2 Keyboard"));
        assert!(!looks_like_keyboard("Logitech USB Receiver Mouse"));
    }

    #[test]
    fn test_select_first_keyboard() {
        let devices = vec![
            info("/dev/input/event0", "Power Button", false),
            info("/dev/input/event3", "AT Translated Set 2 keyboard", true),
            info("/dev/input/event7", "USB Keyboard", true),
        ];
        let selected = select_device(devices, None).unwrap();
        assert_eq!(selected.path, PathBuf::from("/dev/input/event3"));
    }

    #[test]
    fn test_select_without_keyboard() {
        let devices = vec![info("/dev/input/event0", "Power Button", false)];
        assert!(matches!(
            select_device(devices, None),
            Err(DeviceError::NoKeyboard)
        ));
    }

    #[test]
    fn test_select_by_path_or_name() {
        let devices = vec![
            info("/dev/input/event3", "AT Translated Set 2 keyboard", true),
            info("/dev/input/event7", "USB Keyboard", true),
        ];

        let by_path = select_device(devices.clone(), Some("/dev/input/event7")).unwrap();
        assert_eq!(by_path.name, "USB Keyboard");

        let by_name = select_device(devices.clone(), Some("AT Translated Set 2 keyboard")).unwrap();
        assert_eq!(by_name.path, PathBuf::from("/dev/input/event3"));

        assert!(matches!(
            select_device(devices, Some("Nope")),
            Err(DeviceError::NotFound { .. })
        ));
    }

    #[test]
    fn test_select_by_symlinked_path() {
        let dir = tempfile::tempdir().unwrap();
        let node = dir.path().join("event5");
        std::fs::write(&node, b"").unwrap();

        let by_id = dir.path().join("by-id");
        std::fs::create_dir(&by_id).unwrap();
        let link = by_id.join("usb-Keychron_K2-event-kbd");
        std::os::unix::fs::symlink(&node, &link).unwrap();

        let node_path = std::fs::canonicalize(&node).unwrap();
        let devices = vec![
            info("/dev/input/event3", "AT Translated Set 2 keyboard", true),
            info(node_path.to_str().unwrap(), "Keychron K2", true),
        ];

        let selected = select_device(devices.clone(), link.to_str()).unwrap();
        assert_eq!(selected.name, "Keychron K2");

        let dangling = by_id.join("usb-Missing-event-kbd");
        assert!(matches!(
            select_device(devices, dangling.to_str()),
            Err(DeviceError::NotFound { .. })
        ));
    }
}
