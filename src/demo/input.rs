use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use winit::keyboard::KeyCode;

use crate::curve::hilbert::{CurveState, DepthChange};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepthAction {
    IncreaseDepth,
    DecreaseDepth,
}

impl DepthAction {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::IncreaseDepth => "Increase Depth",
            Self::DecreaseDepth => "Decrease Depth",
        }
    }

    pub fn all() -> &'static [DepthAction] {
        &[DepthAction::IncreaseDepth, DepthAction::DecreaseDepth]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
}

impl KeyBind {
    pub fn new(code: KeyCode) -> Self {
        Self { code }
    }
}

impl Serialize for KeyBind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:?}", self.code))
    }
}

impl<'de> Deserialize<'de> for KeyBind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let code = keycode_from_str(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("Unknown key code: {s}")))?;
        Ok(KeyBind { code })
    }
}

fn keycode_from_str(s: &str) -> Option<KeyCode> {
    // Match the Debug output of KeyCode variants
    match s {
        "ArrowUp" => Some(KeyCode::ArrowUp),
        "ArrowDown" => Some(KeyCode::ArrowDown),
        "ArrowLeft" => Some(KeyCode::ArrowLeft),
        "ArrowRight" => Some(KeyCode::ArrowRight),
        "PageUp" => Some(KeyCode::PageUp),
        "PageDown" => Some(KeyCode::PageDown),
        "Equal" => Some(KeyCode::Equal),
        "Minus" => Some(KeyCode::Minus),
        "NumpadAdd" => Some(KeyCode::NumpadAdd),
        "NumpadSubtract" => Some(KeyCode::NumpadSubtract),
        "KeyW" => Some(KeyCode::KeyW),
        "KeyS" => Some(KeyCode::KeyS),
        "KeyJ" => Some(KeyCode::KeyJ),
        "KeyK" => Some(KeyCode::KeyK),
        "Space" => Some(KeyCode::Space),
        "Backspace" => Some(KeyCode::Backspace),
        _ => None,
    }
}

pub fn default_bindings() -> HashMap<DepthAction, KeyBind> {
    use DepthAction::*;
    HashMap::from([
        (IncreaseDepth, KeyBind::new(KeyCode::ArrowUp)),
        (DecreaseDepth, KeyBind::new(KeyCode::ArrowDown)),
    ])
}

/// Maps key presses to depth actions. Only fresh presses count: releases
/// and auto-repeat are dropped, the same as a GLFW `PRESS` filter.
pub struct InputState {
    bindings: HashMap<DepthAction, KeyBind>,
    reverse_map: HashMap<KeyCode, DepthAction>,
}

impl InputState {
    pub fn new(bindings: HashMap<DepthAction, KeyBind>) -> Self {
        let reverse_map = build_reverse_map(&bindings);
        Self {
            bindings,
            reverse_map,
        }
    }

    #[cfg(test)]
    pub fn with_defaults() -> Self {
        Self::new(default_bindings())
    }

    pub fn on_key_event(&self, code: KeyCode, pressed: bool, repeat: bool) -> Option<DepthAction> {
        if !pressed || repeat {
            return None;
        }
        self.reverse_map.get(&code).copied()
    }

    pub fn binding(&self, action: DepthAction) -> Option<KeyBind> {
        self.bindings.get(&action).copied()
    }
}

fn build_reverse_map(bindings: &HashMap<DepthAction, KeyBind>) -> HashMap<KeyCode, DepthAction> {
    let mut map = HashMap::new();
    for (&action, bind) in bindings {
        if let Some(prev) = map.insert(bind.code, action) {
            log::warn!(
                "{:?} bound to both {} and {}; using {}",
                bind.code,
                prev.display_name(),
                action.display_name(),
                action.display_name()
            );
        }
    }
    map
}

/// Apply `action` to the curve and report the result on the log.
pub fn apply_action(curve: &mut CurveState, action: DepthAction) -> DepthChange {
    let change = match action {
        DepthAction::IncreaseDepth => curve.increase(),
        DepthAction::DecreaseDepth => curve.decrease(),
    };
    match change {
        DepthChange::Increased(depth) | DepthChange::Decreased(depth) => {
            log::info!("depth {depth}: {} vertices", curve.points().len());
        }
        DepthChange::AtMinimum => log::info!("already at minimum depth"),
        DepthChange::AtMaximum(max) => log::info!("already at maximum depth ({max})"),
    }
    change
}
