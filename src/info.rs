use anyhow::{anyhow, Result};
use glam::Vec3;

pub const IDLE_PROMPT: &str = "Spin the fish. Hover and click on glowing areas to learn more.";

/// Pick spheres placed around the body, in body-root space.
pub const HIT_REGIONS: [(&str, Vec3, f32); 4] = [
    ("emissions", Vec3::new(0.6, 0.2, 0.0), 0.25),
    ("water", Vec3::new(-0.4, 0.3, 0.3), 0.25),
    ("energy", Vec3::new(0.0, -0.3, 0.5), 0.25),
    ("inequality", Vec3::new(-0.5, -0.2, -0.4), 0.25),
];

pub fn region_message(name: &str) -> Option<&'static str> {
    match name {
        "emissions" => Some(
            "Carbon Emissions: gAI data centers generate massive CO₂ emissions, contributing to climate change and global warming.",
        ),
        "water" => Some(
            "Water Consumption: AI infrastructure requires enormous amounts of water for cooling, straining local water resources.",
        ),
        "energy" => Some(
            "Energy Demand: The computational power needed for gAI consumes vast amounts of electricity, often from non-renewable sources.",
        ),
        "inequality" => Some(
            "Global Inequality: The environmental costs of gAI disproportionately affect developing regions while benefits accrue elsewhere.",
        ),
        _ => None,
    }
}

/// Text for the info line: the region's message, or the idle prompt.
pub fn info_text_for(region: Option<&str>) -> &'static str {
    region.and_then(region_message).unwrap_or(IDLE_PROMPT)
}

/// Mutually exclusive content panels toggled by name.
#[derive(Debug, Clone)]
pub struct InfoPanel {
    tabs: Vec<String>,
    active: usize,
}

impl InfoPanel {
    pub fn new<I, S>(tabs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tabs: Vec<String> = tabs.into_iter().map(Into::into).collect();
        if tabs.is_empty() {
            return Err(anyhow!("InfoPanel needs at least one tab"));
        }
        Ok(Self { tabs, active: 0 })
    }

    pub fn select(&mut self, name: &str) -> bool {
        match self.tabs.iter().position(|tab| tab == name) {
            Some(index) => {
                self.active = index;
                true
            }
            None => false,
        }
    }

    pub fn active(&self) -> &str {
        &self.tabs[self.active]
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.active() == name
    }

    pub fn tabs(&self) -> &[String] {
        &self.tabs
    }
}
