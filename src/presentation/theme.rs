use eframe::egui;

pub struct Palette {
    pub bg: egui::Color32,
    pub fg: egui::Color32,
    pub stroke: egui::Color32,
    pub hover: egui::Color32,
    pub active: egui::Color32,
    pub selection: egui::Color32,
}

impl Palette {
    pub fn new(is_dark: bool) -> Self {
        if is_dark {
            Self {
                bg: egui::Color32::from_rgb(25, 25, 25),
                fg: egui::Color32::WHITE,
                stroke: egui::Color32::WHITE,
                hover: egui::Color32::from_rgb(255, 200, 0),
                active: egui::Color32::from_rgb(0, 255, 127),
                selection: egui::Color32::from_rgb(0, 160, 200),
            }
        } else {
            Self {
                bg: egui::Color32::from_rgb(245, 245, 245),
                fg: egui::Color32::BLACK,
                stroke: egui::Color32::BLACK,
                hover: egui::Color32::from_rgb(255, 220, 0),
                active: egui::Color32::from_rgb(0, 255, 100),
                selection: egui::Color32::from_rgb(0, 200, 255),
            }
        }
    }
}

/// Flat, high-contrast style with square corners.
pub fn configure_theme(ctx: &egui::Context, is_dark: bool) {
    let mut style = (*ctx.style()).clone();
    let palette = Palette::new(is_dark);

    style
        .text_styles
        .iter_mut()
        .for_each(|(text_style, font_id)| {
            font_id.size = match text_style {
                egui::TextStyle::Heading => 24.0,
                egui::TextStyle::Body | egui::TextStyle::Button => 15.0,
                _ => font_id.size,
            };
        });

    style.spacing.item_spacing = egui::vec2(10.0, 8.0);
    style.spacing.button_padding = egui::vec2(14.0, 8.0);

    let widgets = &mut style.visuals.widgets;
    for (visuals, width, fill) in [
        (&mut widgets.noninteractive, 2.0, palette.bg),
        (&mut widgets.inactive, 2.0, palette.bg),
        (&mut widgets.hovered, 2.5, palette.hover),
        (&mut widgets.active, 3.0, palette.active),
    ] {
        visuals.bg_stroke = egui::Stroke::new(width, palette.stroke);
        visuals.rounding = egui::Rounding::ZERO;
        visuals.bg_fill = fill;
        visuals.weak_bg_fill = fill;
        visuals.fg_stroke = egui::Stroke::new(1.0, palette.fg);
    }
    widgets.hovered.fg_stroke = egui::Stroke::new(1.0, egui::Color32::BLACK);
    widgets.active.fg_stroke = egui::Stroke::new(1.0, egui::Color32::BLACK);

    style.visuals.selection.stroke = egui::Stroke::new(1.0, palette.stroke);
    style.visuals.selection.bg_fill = palette.selection;

    style.visuals.window_rounding = egui::Rounding::ZERO;
    style.visuals.window_stroke = egui::Stroke::new(2.0, palette.stroke);
    style.visuals.window_shadow = egui::Shadow {
        offset: egui::vec2(6.0, 6.0),
        blur: 0.0,
        spread: 0.0,
        color: palette.stroke,
    };
    style.visuals.window_fill = palette.bg;
    style.visuals.panel_fill = palette.bg;
    style.visuals.override_text_color = Some(palette.fg);

    ctx.set_style(style);
}
