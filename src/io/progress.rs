//! Multi-slide progress tracking with automatic batching for large sets

use crate::io::configuration::MAX_INDIVIDUAL_PROGRESS_BARS;
use crate::sampling::evaluator::Verdict;
use crate::sampling::sampler::SamplingObserver;
use crate::sampling::sources::ClassLabel;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::LazyLock;

/// Per-slide display state
#[derive(Clone, Debug, Default)]
struct SlideState {
    name: String,
    class: Option<ClassLabel>,
    evaluated: usize,
    seeds: usize,
    accepted: usize,
}

/// Coordinates progress display for batch sampling
///
/// Shows one bar per slide for small batches, and a rolling window of the
/// most recent slides plus an overall bar for large ones. While a slide is
/// sampled the manager receives its class and seed events as a
/// [`SamplingObserver`].
pub struct ProgressManager {
    multi_progress: MultiProgress,
    batch_bar: Option<ProgressBar>,
    slide_bars: Vec<ProgressBar>,
    slide_states: Vec<SlideState>,
    current: usize,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

static PROGRESS_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{msg} [{bar:30.cyan/blue}] {prefix}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] Slides: [{bar:40.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
});

impl ProgressManager {
    /// Create a new progress manager
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            batch_bar: None,
            slide_bars: Vec::new(),
            slide_states: Vec::new(),
            current: 0,
        }
    }

    /// Initialize progress bars based on slide count
    pub fn initialize(&mut self, slide_count: usize) {
        // Switch to batch mode for large slide sets to avoid terminal spam
        if slide_count > MAX_INDIVIDUAL_PROGRESS_BARS + 1 {
            let batch_bar = ProgressBar::new(slide_count as u64);
            batch_bar.set_style(BATCH_STYLE.clone());
            self.batch_bar = Some(self.multi_progress.add(batch_bar));
        }

        let bars_to_create = slide_count.min(MAX_INDIVIDUAL_PROGRESS_BARS);
        for _ in 0..bars_to_create {
            let pb = ProgressBar::new(0);
            pb.set_style(PROGRESS_STYLE.clone());
            self.slide_bars.push(self.multi_progress.add(pb));
        }
    }

    /// Make `index` the slide receiving sampling events
    pub fn start_slide(&mut self, index: usize, slide_id: &str) {
        if index >= self.slide_states.len() {
            self.slide_states.resize(index + 1, SlideState::default());
        }
        if let Some(state) = self.slide_states.get_mut(index) {
            *state = SlideState {
                name: slide_id.to_string(),
                ..SlideState::default()
            };
        }
        self.current = index;
        self.update_bars();
    }

    /// Mark a slide as completed and update batch progress
    pub fn complete_slide(&mut self, index: usize) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.inc(1);
        }

        if let Some(state) = self.slide_states.get_mut(index) {
            state.name = format!("✓ {}", state.name);
            state.class = None;
            state.evaluated = state.seeds;
        }
        self.update_bars();
    }

    /// Patches accepted so far for a slide
    pub fn accepted(&self, index: usize) -> usize {
        self.slide_states
            .get(index)
            .map_or(0, |state| state.accepted)
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.finish_with_message("All slides sampled");
        }
        let _ = self.multi_progress.clear();
    }

    /// Update all progress bars to show the last N active slides
    fn update_bars(&self) {
        let active: Vec<&SlideState> = self
            .slide_states
            .iter()
            .filter(|state| !state.name.is_empty())
            .collect();

        let start_idx = active.len().saturating_sub(MAX_INDIVIDUAL_PROGRESS_BARS);
        let visible = active.get(start_idx..).unwrap_or(&[]);

        for (bar_idx, state) in visible.iter().enumerate() {
            if let Some(bar) = self.slide_bars.get(bar_idx) {
                bar.set_length(state.seeds as u64);
                bar.set_position(state.evaluated as u64);
                let class = state
                    .class
                    .map_or_else(String::new, |class| format!("class {class} "));
                bar.set_message(format!("{class}{} accepted", state.accepted));
                bar.set_prefix(state.name.clone());
            }
        }

        // Clear any unused bars
        for bar_idx in visible.len()..self.slide_bars.len() {
            if let Some(bar) = self.slide_bars.get(bar_idx) {
                bar.set_length(0);
                bar.set_position(0);
                bar.set_message(String::new());
                bar.set_prefix(String::new());
            }
        }
    }
}

impl SamplingObserver for ProgressManager {
    fn class_started(&mut self, class: ClassLabel, seeds: usize) {
        if let Some(state) = self.slide_states.get_mut(self.current) {
            state.class = Some(class);
            state.evaluated = 0;
            state.seeds = seeds;
        }
        self.update_bars();
    }

    fn seed_evaluated(&mut self, _class: ClassLabel, verdict: &Verdict) {
        if let Some(state) = self.slide_states.get_mut(self.current) {
            state.evaluated += 1;
            if verdict.is_accepted() {
                state.accepted += 1;
            }
        }
        self.update_bars();
    }
}
