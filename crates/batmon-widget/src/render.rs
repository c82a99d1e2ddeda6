//! Projection of a normalized status onto display targets

use crate::config::TargetIds;
use crate::format::{IndicatorClass, UNAVAILABLE, UNAVAILABLE_CLASS, format_eta, format_status};
use crate::normalize::{NormalizedStatus, Reading};
use crate::surface::{Element, Surface};

/// Writes widget output to a surface
///
/// Every target is looked up independently; a missing one is skipped.
#[derive(Debug, Clone)]
pub struct Renderer {
    targets: TargetIds,
}

impl Renderer {
    pub fn new(targets: TargetIds) -> Self {
        Self { targets }
    }

    pub fn targets(&self) -> &TargetIds {
        &self.targets
    }

    /// Render a known status
    pub fn render<S: Surface>(&self, surface: &mut S, status: &NormalizedStatus) {
        self.show_nav_item(surface);

        let percent = status.percent.is_finite().then_some(status.percent);

        set_text(
            surface,
            &self.targets.text,
            // `+ 0.0` folds -0 into 0
            &percent.map_or_else(
                || UNAVAILABLE.to_string(),
                |p| format!("{:.0}%", p.round() + 0.0),
            ),
        );

        let class = IndicatorClass::select(status.percent, &status.status);
        if let Some(led) = surface.element(&self.targets.led) {
            led.set_class(&class.to_string());
        }

        set_text(
            surface,
            &self.targets.percent,
            &percent.map_or_else(|| UNAVAILABLE.to_string(), |p| format!("{:.1}%", p)),
        );

        let voltage = status.voltage.is_finite().then_some(status.voltage);
        set_text(
            surface,
            &self.targets.voltage,
            &voltage.map_or_else(|| UNAVAILABLE.to_string(), |v| format!("{:.2}V", v)),
        );

        set_text(surface, &self.targets.status, format_status(&status.status));

        set_text(
            surface,
            &self.targets.rate,
            &display_reading(&status.rate_per_hour, |rate| format!("{:.2}%/h", rate)),
        );

        set_text(
            surface,
            &self.targets.eta,
            &display_reading(&status.eta_hours, format_eta),
        );
    }

    /// Render the "no data" state
    pub fn render_unavailable<S: Surface>(&self, surface: &mut S) {
        self.show_nav_item(surface);

        set_text(surface, &self.targets.text, UNAVAILABLE);

        if let Some(led) = surface.element(&self.targets.led) {
            led.set_class(UNAVAILABLE_CLASS);
        }

        for id in [
            &self.targets.percent,
            &self.targets.voltage,
            &self.targets.rate,
            &self.targets.eta,
        ] {
            set_text(surface, id, UNAVAILABLE);
        }
        set_text(surface, &self.targets.status, format_status(""));
    }

    // The nav entry is only ever hidden from outside the widget.
    fn show_nav_item<S: Surface>(&self, surface: &mut S) {
        if let Some(nav) = surface.element(&self.targets.nav_item) {
            nav.set_visible(true);
        }
    }
}

fn set_text<S: Surface>(surface: &mut S, id: &str, text: &str) {
    if let Some(el) = surface.element(id) {
        el.set_text(text);
    }
}

fn display_reading(reading: &Reading, format_number: impl FnOnce(f64) -> String) -> String {
    if let Some(n) = reading.as_finite() {
        format_number(n)
    } else if let Some(text) = reading.as_text() {
        text.to_string()
    } else {
        UNAVAILABLE.to_string()
    }
}
