//! 配色

use egui::style::WidgetVisuals;
use egui::{Color32, Rounding, Stroke, Visuals};

pub struct MidiTheme;

impl MidiTheme {
    pub const BG_DEEP: Color32 = Color32::from_rgb(16, 20, 26);
    pub const BG_SURFACE: Color32 = Color32::from_rgb(26, 32, 40);
    pub const BG_ELEVATED: Color32 = Color32::from_rgb(38, 46, 58);
    pub const ACCENT: Color32 = Color32::from_rgb(92, 156, 255);
    pub const SUCCESS: Color32 = Color32::from_rgb(96, 200, 140);
    pub const DANGER: Color32 = Color32::from_rgb(236, 96, 96);
    pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(232, 236, 242);
    pub const TEXT_MUTED: Color32 = Color32::from_rgb(140, 150, 164);
    pub const BORDER: Color32 = Color32::from_rgb(56, 64, 78);

    const ROUNDING: f32 = 6.0;

    pub fn apply(ctx: &egui::Context) {
        ctx.set_visuals(Self::visuals());
        ctx.style_mut(|style| {
            style.spacing.item_spacing = egui::vec2(8.0, 6.0);
            style.spacing.window_margin = egui::Margin::same(12.0);
            style.spacing.button_padding = egui::vec2(10.0, 5.0);
        });
    }

    fn visuals() -> Visuals {
        let mut visuals = Visuals {
            panel_fill: Self::BG_DEEP,
            window_fill: Self::BG_SURFACE,
            extreme_bg_color: Self::BG_DEEP,
            faint_bg_color: Self::BG_SURFACE,
            window_rounding: Rounding::same(10.0),
            window_stroke: Stroke::new(1.0, Self::BORDER),
            ..Visuals::dark()
        };
        visuals.selection.bg_fill = Self::ACCENT.gamma_multiply(0.45);
        visuals.selection.stroke = Stroke::new(1.0, Self::ACCENT);

        let widgets = &mut visuals.widgets;
        paint(&mut widgets.noninteractive, Self::BG_SURFACE, Self::TEXT_MUTED);
        paint(&mut widgets.inactive, Self::BG_ELEVATED, Self::TEXT_PRIMARY);
        paint(&mut widgets.hovered, Self::ACCENT.gamma_multiply(0.35), Self::TEXT_PRIMARY);
        paint(&mut widgets.active, Self::ACCENT, Self::BG_DEEP);

        visuals
    }
}

fn paint(widget: &mut WidgetVisuals, fill: Color32, text: Color32) {
    widget.bg_fill = fill;
    widget.weak_bg_fill = fill;
    widget.fg_stroke = Stroke::new(1.0, text);
    widget.rounding = Rounding::same(MidiTheme::ROUNDING);
}
