//! Colours and visuals for the directory window.

use eframe::egui;

#[derive(Debug, Clone, Copy)]
pub struct DirectoryPalette {
    pub app_background: egui::Color32,
    pub header_background: egui::Color32,
    pub header_stroke: egui::Color32,
    pub card_background: egui::Color32,
    pub card_stroke: egui::Color32,
    pub accent: egui::Color32,
    pub danger: egui::Color32,
    pub muted_text: egui::Color32,
}

impl Default for DirectoryPalette {
    fn default() -> Self {
        Self {
            app_background: egui::Color32::from_rgb(250, 250, 250),
            header_background: egui::Color32::from_rgb(0xee, 0xee, 0xee),
            header_stroke: egui::Color32::from_rgb(214, 214, 214),
            card_background: egui::Color32::WHITE,
            card_stroke: egui::Color32::from_rgb(224, 224, 224),
            accent: egui::Color32::from_rgb(25, 118, 210),
            danger: egui::Color32::from_rgb(198, 40, 40),
            muted_text: egui::Color32::from_rgb(117, 117, 117),
        }
    }
}

pub fn visuals_for_palette(palette: DirectoryPalette) -> egui::Visuals {
    let mut visuals = egui::Visuals::light();
    visuals.panel_fill = palette.app_background;
    visuals.window_fill = palette.card_background;
    visuals.hyperlink_color = palette.accent;
    visuals.selection.bg_fill = palette.accent;
    visuals.widgets.hovered.bg_fill = palette.accent.gamma_multiply(0.15);
    visuals.window_corner_radius = egui::CornerRadius::same(8);
    visuals.menu_corner_radius = egui::CornerRadius::same(6);
    visuals
}

/// Paints the header logo: a dumbbell glyph in the accent colour.
pub fn paint_logo(ui: &mut egui::Ui, palette: DirectoryPalette, size: f32) {
    let (rect, _) = ui.allocate_exact_size(egui::vec2(size, size), egui::Sense::hover());
    let painter = ui.painter_at(rect);
    let center = rect.center();
    let bar = egui::Rect::from_center_size(center, egui::vec2(size * 0.6, size * 0.12));
    painter.rect_filled(bar, 2.0, palette.accent);

    let plate = egui::vec2(size * 0.14, size * 0.55);
    for offset in [-0.32, 0.32] {
        let plate_center = center + egui::vec2(size * offset, 0.0);
        painter.rect_filled(
            egui::Rect::from_center_size(plate_center, plate),
            2.0,
            palette.accent,
        );
    }
}
