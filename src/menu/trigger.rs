//! Activation trigger: secondary click or long-press

use std::time::{Duration, Instant};

use crate::config::{DeviceConfig, DeviceMode};
use crate::page::ElementRef;

/// User-agent tokens that mark a touch-primary device
const MOBILE_TOKENS: [&str; 19] = [
    "phone",
    "pad",
    "pod",
    "iphone",
    "ipod",
    "ios",
    "ipad",
    "android",
    "mobile",
    "blackberry",
    "iemobile",
    "mqqbrowser",
    "juc",
    "fennec",
    "wosbrowser",
    "browserng",
    "webos",
    "symbian",
    "windows phone",
];

/// How the device asks for a contextual menu, decided once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCapabilities {
    pub supports_context_gesture: bool,
    pub supports_long_press: bool,
}

impl DeviceCapabilities {
    pub fn pointer() -> Self {
        Self {
            supports_context_gesture: true,
            supports_long_press: false,
        }
    }

    pub fn touch() -> Self {
        Self {
            supports_context_gesture: false,
            supports_long_press: true,
        }
    }

    /// Best-effort classification from the user-agent string
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_lowercase();
        if MOBILE_TOKENS.iter().any(|token| ua.contains(token)) {
            Self::touch()
        } else {
            Self::pointer()
        }
    }

    pub fn from_config(config: &DeviceConfig) -> Self {
        match config.mode {
            DeviceMode::Pointer => Self::pointer(),
            DeviceMode::Touch => Self::touch(),
            DeviceMode::Auto => config
                .user_agent
                .as_deref()
                .map(Self::from_user_agent)
                .unwrap_or_else(Self::pointer),
        }
    }
}

/// Request to open the menu on a target at viewport coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    /// `None` when nothing was under the pointer
    pub target: Option<ElementRef>,
    pub x: i32,
    pub y: i32,
}

/// Outcome of a secondary click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickDecision {
    /// Suppress the native menu and open ours
    Activate(Activation),
    /// Let the native menu through
    Yield,
    /// Gesture not handled on this device
    Ignore,
}

#[derive(Debug, Clone, Copy)]
struct PendingPress {
    activation: Activation,
    armed_at: Instant,
}

#[derive(Debug, Clone)]
pub struct ActivationTrigger {
    capabilities: DeviceCapabilities,
    long_press: Duration,
    pending: Option<PendingPress>,
}

impl ActivationTrigger {
    pub fn new(capabilities: DeviceCapabilities, long_press: Duration) -> Self {
        Self {
            capabilities,
            long_press,
            pending: None,
        }
    }

    pub fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    /// Secondary click; holding `bypass` (Ctrl) asks for the native menu
    pub fn secondary_click(
        &mut self,
        target: Option<ElementRef>,
        x: i32,
        y: i32,
        bypass: bool,
    ) -> ClickDecision {
        if !self.capabilities.supports_context_gesture {
            return ClickDecision::Ignore;
        }
        if bypass {
            return ClickDecision::Yield;
        }
        self.pending = None;
        ClickDecision::Activate(Activation { target, x, y })
    }

    /// Arm the long-press timer. A new touch replaces any pending one.
    pub fn touch_start(&mut self, target: Option<ElementRef>, x: i32, y: i32, at: Instant) {
        if !self.capabilities.supports_long_press {
            return;
        }
        self.pending = Some(PendingPress {
            activation: Activation { target, x, y },
            armed_at: at,
        });
    }

    pub fn touch_move(&mut self) {
        self.pending = None;
    }

    pub fn touch_end(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Fire the long-press once its hold time has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<Activation> {
        let pending = self.pending?;
        if now.saturating_duration_since(pending.armed_at) < self.long_press {
            return None;
        }
        self.pending = None;
        Some(pending.activation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLD: Duration = Duration::from_millis(380);

    #[test]
    fn test_user_agent_classification() {
        let iphone = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15";
        let desktop = "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
        assert_eq!(DeviceCapabilities::from_user_agent(iphone), DeviceCapabilities::touch());
        assert_eq!(DeviceCapabilities::from_user_agent(desktop), DeviceCapabilities::pointer());
        assert_eq!(
            DeviceCapabilities::from_user_agent("Mozilla/5.0 (Linux; Android 14; Pixel 8)"),
            DeviceCapabilities::touch()
        );
    }

    #[test]
    fn test_config_mode_overrides_user_agent() {
        let config = DeviceConfig {
            mode: DeviceMode::Pointer,
            user_agent: Some("Android".into()),
        };
        assert_eq!(DeviceCapabilities::from_config(&config), DeviceCapabilities::pointer());
        let config = DeviceConfig {
            mode: DeviceMode::Auto,
            user_agent: Some("Android".into()),
        };
        assert_eq!(DeviceCapabilities::from_config(&config), DeviceCapabilities::touch());
    }

    #[test]
    fn test_secondary_click_and_bypass() {
        let mut trigger = ActivationTrigger::new(DeviceCapabilities::pointer(), HOLD);
        assert_eq!(
            trigger.secondary_click(None, 4, 5, false),
            ClickDecision::Activate(Activation {
                target: None,
                x: 4,
                y: 5
            })
        );
        assert_eq!(trigger.secondary_click(None, 4, 5, true), ClickDecision::Yield);

        let mut touch = ActivationTrigger::new(DeviceCapabilities::touch(), HOLD);
        assert_eq!(touch.secondary_click(None, 4, 5, false), ClickDecision::Ignore);
    }

    #[test]
    fn test_long_press_fires_once_after_hold() {
        let mut trigger = ActivationTrigger::new(DeviceCapabilities::touch(), HOLD);
        let start = Instant::now();
        trigger.touch_start(None, 1, 2, start);

        assert_eq!(trigger.poll(start + Duration::from_millis(379)), None);
        let fired = trigger.poll(start + HOLD);
        assert_eq!(
            fired,
            Some(Activation {
                target: None,
                x: 1,
                y: 2
            })
        );
        assert_eq!(trigger.poll(start + Duration::from_secs(2)), None);
    }

    #[test]
    fn test_move_or_release_cancels_long_press() {
        let mut trigger = ActivationTrigger::new(DeviceCapabilities::touch(), HOLD);
        let start = Instant::now();

        trigger.touch_start(None, 0, 0, start);
        trigger.touch_move();
        trigger.touch_end();
        assert!(!trigger.is_pending());
        assert_eq!(trigger.poll(start + Duration::from_secs(1)), None);

        trigger.touch_start(None, 0, 0, start);
        trigger.touch_end();
        assert_eq!(trigger.poll(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_pointer_device_ignores_touch() {
        let mut trigger = ActivationTrigger::new(DeviceCapabilities::pointer(), HOLD);
        let start = Instant::now();
        trigger.touch_start(None, 0, 0, start);
        assert_eq!(trigger.poll(start + Duration::from_secs(1)), None);
    }
}
