use anyhow::{bail, Result};
use std::fmt;

/// One checkpoint on the 2020–2050 pollution timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub year: i32,
    pub progress: f32,
    pub label: String,
    pub fact: String,
}

impl TimelineEntry {
    pub fn new(year: i32, progress: f32, label: impl Into<String>, fact: impl Into<String>) -> Self {
        Self { year, progress, label: label.into(), fact: fact.into() }
    }
}

/// Everything the timeline control shows for a selected year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearReadout {
    pub year: i32,
    pub progress: f32,
    pub label: String,
    pub fact: String,
}

impl fmt::Display for YearReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.year, self.label)
    }
}

/// Ordered checkpoint list with year → progress/label/fact lookups.
#[derive(Debug, Clone)]
pub struct Timeline {
    entries: Vec<TimelineEntry>,
}

impl Timeline {
    pub fn new(entries: Vec<TimelineEntry>) -> Result<Self> {
        if entries.is_empty() {
            bail!("Timeline requires at least one checkpoint");
        }
        for pair in entries.windows(2) {
            if pair[1].year <= pair[0].year {
                bail!(
                    "Timeline checkpoints must be strictly ascending by year ({} follows {})",
                    pair[1].year,
                    pair[0].year
                );
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[TimelineEntry] {
        &self.entries
    }

    pub fn first_year(&self) -> i32 {
        self.first().year
    }

    pub fn last_year(&self) -> i32 {
        self.last().year
    }

    fn first(&self) -> &TimelineEntry {
        &self.entries[0]
    }

    fn last(&self) -> &TimelineEntry {
        &self.entries[self.entries.len() - 1]
    }

    /// Returns the bracketing pair and the normalized position of `year` between them.
    fn bracket(&self, year: i32) -> Option<(&TimelineEntry, &TimelineEntry, f32)> {
        self.entries.windows(2).find(|pair| year >= pair[0].year && year <= pair[1].year).map(|pair| {
            let span = (i64::from(pair[1].year) - i64::from(pair[0].year)) as f64;
            let t = ((i64::from(year) - i64::from(pair[0].year)) as f64 / span) as f32;
            (&pair[0], &pair[1], t)
        })
    }

    pub fn progress_for_year(&self, year: i32) -> f32 {
        if year <= self.first_year() {
            return self.first().progress;
        }
        if year >= self.last_year() {
            return self.last().progress;
        }
        match self.bracket(year) {
            Some((a, b, t)) => a.progress + (b.progress - a.progress) * t,
            None => 0.0,
        }
    }

    /// Step function: the earlier label holds until the midpoint of the interval, then the next one.
    pub fn label_for_year(&self, year: i32) -> &str {
        if year <= self.first_year() {
            return &self.first().label;
        }
        if year >= self.last_year() {
            return &self.last().label;
        }
        match self.bracket(year) {
            Some((a, b, t)) => {
                if t < 0.5 {
                    &a.label
                } else {
                    &b.label
                }
            }
            None => &self.first().label,
        }
    }

    /// Fact of the checkpoint whose `[year, next_year)` interval contains `year`; empty outside the range.
    pub fn fact_for_year(&self, year: i32) -> &str {
        if year < self.first_year() || year > self.last_year() {
            return "";
        }
        for (idx, entry) in self.entries.iter().enumerate() {
            let next_year = self.entries.get(idx + 1).map_or(i32::MAX, |next| next.year);
            if year >= entry.year && year < next_year {
                return &entry.fact;
            }
        }
        ""
    }

    pub fn entry_for_year(&self, year: i32) -> Option<&TimelineEntry> {
        self.entries.iter().find(|entry| entry.year == year)
    }

    pub fn readout(&self, year: i32) -> YearReadout {
        YearReadout {
            year,
            progress: self.progress_for_year(year),
            label: self.label_for_year(year).to_string(),
            fact: self.fact_for_year(year).to_string(),
        }
    }

    /// The fourteen checkpoints shipped with the visualization.
    pub fn standard() -> Self {
        let entries = vec![
            TimelineEntry::new(
                2020,
                0.0,
                "Pre-gAI Baseline",
                "Before the generative AI boom, global data centers consumed ~200 terawatt-hours of electricity annually, comparable to South Korea's total usage. E-waste worldwide hit ~53.6 million metric tons, driven by fast-growing electronics demand.",
            ),
            TimelineEntry::new(
                2021,
                0.05,
                "Infrastructure Foundation",
                "AI infrastructure quietly expanded as companies like Google, Meta, and Microsoft built hyperscale data centers. Each new site required hundreds of megawatts, enough to power tens of thousands of homes.",
            ),
            TimelineEntry::new(
                2022,
                0.1,
                "gAI Lift-off",
                "ChatGPT launched, sparking global gAI use. Global data centers consumed ~460 terawatt-hours, roughly equivalent to France's entire electricity use. GPT-3 training alone consumed ~1,287 megawatt-hours (1.3 million kilowatt-hours), enough to power about 120 U.S. homes for a year or charge over 100 million smartphones.",
            ),
            TimelineEntry::new(
                2023,
                0.2,
                "The Thirst Emerges",
                "Studies revealed training GPT-4 likely required millions of liters of water. Each user session with ChatGPT (~20 prompts) indirectly consumed ~500ml, roughly a standard water bottle's worth. U.S. AI data centers began drawing over 4% of national electricity.",
            ),
            TimelineEntry::new(
                2024,
                0.25,
                "Compute Arms Race",
                "Over 3.8 million high-performance GPUs shipped globally to meet AI demand, causing rapid turnover and growing e-waste. Cloud providers announced plans to double data-center capacity within two years.",
            ),
            TimelineEntry::new(
                2025,
                0.3,
                "Grid Crunch",
                "U.S. projections showed data centers may consume 6.7% to 12% of national electricity by 2028, more than the total usage of some countries. Multiple utilities in Virginia and Arizona delayed new AI server farms due to power strain.",
            ),
            TimelineEntry::new(
                2026,
                0.35,
                "Regulatory Awakening",
                "The EU passed the AI Act, mandating disclosure of energy, water, and carbon metrics for large models. Several U.S. states introduced similar bills. Tech firms began issuing sustainability labels for their AI APIs.",
            ),
            TimelineEntry::new(
                2028,
                0.45,
                "Water Tipping Point",
                "U.S. AI data centers projected to consume 720 billion gallons of water annually for cooling, equal to the indoor use of ~18 million homes. Major drought states, including Arizona, restricted AI expansion permits.",
            ),
            TimelineEntry::new(
                2030,
                0.6,
                "Carbon Reckoning",
                "Unregulated gAI growth could emit 220 million metric tons of CO2 annually, comparable to 50 million gasoline-powered cars. Companies scrambled to integrate carbon-aware scheduling and dynamic model loading.",
            ),
            TimelineEntry::new(
                2032,
                0.68,
                "Hardware Pushback",
                "New global rules required modular, upgradeable GPUs for AI hardware. Chip refresh cycles slowed to 5 years, reducing landfill-bound electronics by 60%.",
            ),
            TimelineEntry::new(
                2035,
                0.75,
                "AI Net-Zero Threshold",
                "Major cloud providers (AWS, Google, Azure) certified 100% carbon-free operations in the U.S. and EU. Renewable-aligned inference scheduling became industry standard, shifting workloads to times and locations with solar or wind surpluses.",
            ),
            TimelineEntry::new(
                2040,
                0.85,
                "Smart Cooling Era",
                "Advanced immersion cooling and reclaimed wastewater systems slashed water consumption by 70%. Urban data centers now fed district heating networks with AI waste heat, warming homes in winter.",
            ),
            TimelineEntry::new(
                2045,
                0.95,
                "Circular Compute",
                "Global recycling infrastructure enabled recovery of 80% of rare earth metals from old AI chips. Manufacturing emissions dropped significantly through reuse-first chip design.",
            ),
            TimelineEntry::new(
                2050,
                1.0,
                "Sustainable Singularity?",
                "With carbon-free energy and AI workloads optimized to near-zero waste, each AI query now uses 90% less energy than in 2023. Generative AI becomes a model of global sustainable computing, achieved through policy, innovation, and infrastructure alignment.",
            ),
        ];
        Self { entries }
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_point() -> Timeline {
        Timeline::new(vec![
            TimelineEntry::new(0, 0.0, "start", "first fact"),
            TimelineEntry::new(100, 1.0, "end", "last fact"),
        ])
        .expect("valid timeline")
    }

    #[test]
    fn clamps_progress_outside_range() {
        let timeline = Timeline::standard();
        assert_eq!(timeline.progress_for_year(1990), 0.0);
        assert_eq!(timeline.progress_for_year(2019), 0.0);
        assert_eq!(timeline.progress_for_year(2051), 1.0);
        assert_eq!(timeline.progress_for_year(2100), 1.0);
    }

    #[test]
    fn interpolates_at_interval_midpoint() {
        let timeline = Timeline::standard();
        assert!((timeline.progress_for_year(2029) - 0.525).abs() < 1e-6);
        assert!((timeline.progress_for_year(2027) - 0.40).abs() < 1e-6);
        let line = two_point();
        assert!((line.progress_for_year(50) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn progress_is_monotonic_over_range() {
        let timeline = Timeline::standard();
        let mut previous = f32::MIN;
        for year in 2015..=2055 {
            let progress = timeline.progress_for_year(year);
            assert!(progress >= previous, "progress dipped at {year}");
            previous = progress;
        }
    }

    #[test]
    fn label_switches_at_interval_midpoint() {
        let line = two_point();
        assert_eq!(line.label_for_year(49), "start");
        assert_eq!(line.label_for_year(50), "end");
        assert_eq!(line.label_for_year(51), "end");
        assert_eq!(line.label_for_year(-5), "start");
        assert_eq!(line.label_for_year(500), "end");
    }

    #[test]
    fn fact_uses_left_closed_intervals() {
        let timeline = Timeline::standard();
        let fact_2028 = &timeline.entry_for_year(2028).unwrap().fact;
        let fact_2030 = &timeline.entry_for_year(2030).unwrap().fact;
        assert_eq!(timeline.fact_for_year(2028), fact_2028);
        assert_eq!(timeline.fact_for_year(2029), fact_2028);
        assert_eq!(timeline.fact_for_year(2030), fact_2030);
        assert_eq!(timeline.fact_for_year(2050), timeline.entry_for_year(2050).unwrap().fact);
        assert_eq!(timeline.fact_for_year(2019), "");
        assert_eq!(timeline.fact_for_year(2051), "");
    }

    #[test]
    fn extreme_year_spans_interpolate() {
        let line = Timeline::new(vec![
            TimelineEntry::new(i32::MIN, 0.0, "start", ""),
            TimelineEntry::new(i32::MAX, 1.0, "end", ""),
        ])
        .expect("valid timeline");
        assert!((line.progress_for_year(0) - 0.5).abs() < 1e-3);
        assert_eq!(line.label_for_year(-1_000_000), "start");
        assert_eq!(line.label_for_year(1_000_000), "end");
    }

    #[test]
    fn rejects_unsorted_or_empty_checkpoints() {
        assert!(Timeline::new(Vec::new()).is_err());
        let err = Timeline::new(vec![
            TimelineEntry::new(2030, 0.5, "b", ""),
            TimelineEntry::new(2030, 0.6, "c", ""),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("ascending"));
    }

    #[test]
    fn readout_formats_year_and_label() {
        let readout = Timeline::standard().readout(2028);
        assert_eq!(readout.to_string(), "2028: Water Tipping Point");
        assert!((readout.progress - 0.45).abs() < 1e-6);
    }
}
