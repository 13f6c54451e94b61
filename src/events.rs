use bevy_ecs::prelude::{Entity, Resource};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    YearChanged { year: i32, progress: f32 },
    BodyInstalled { parts: usize, spine: usize, clip: Option<String> },
    FlaresInstalled { count: usize },
    TextureResolved { path: String },
    TextureFailed { path: String, reason: String },
    HoverChanged { region: Option<String> },
    TooltipToggled { flare: Entity, active: bool },
}

impl fmt::Display for SceneEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneEvent::YearChanged { year, progress } => {
                write!(f, "YearChanged year={year} progress={progress:.3}")
            }
            SceneEvent::BodyInstalled { parts, spine, clip } => match clip {
                Some(name) => write!(f, "BodyInstalled parts={parts} spine={spine} clip={name}"),
                None => write!(f, "BodyInstalled parts={parts} spine={spine} procedural"),
            },
            SceneEvent::FlaresInstalled { count } => write!(f, "FlaresInstalled count={count}"),
            SceneEvent::TextureResolved { path } => write!(f, "TextureResolved path={path}"),
            SceneEvent::TextureFailed { path, reason } => {
                write!(f, "TextureFailed path={path} reason={reason}")
            }
            SceneEvent::HoverChanged { region } => {
                write!(f, "HoverChanged region={}", region.as_deref().unwrap_or("-"))
            }
            SceneEvent::TooltipToggled { flare, active } => {
                write!(f, "TooltipToggled flare={} active={active}", flare.index())
            }
        }
    }
}

#[derive(Default, Resource)]
pub struct EventBus {
    events: Vec<SceneEvent>,
}

impl EventBus {
    pub fn push(&mut self, event: SceneEvent) {
        self.events.push(event);
    }

    pub fn drain(&mut self) -> Vec<SceneEvent> {
        self.events.drain(..).collect()
    }
}
