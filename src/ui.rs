use egui::{Align2, Color32, Context, RichText};

use crate::config::LocomotionMode;
use crate::controller::{HudState, PickupNotice, RunResult, TurboPhase};
use crate::i18n::{format_seconds, Locale, Strings};

const NEON: Color32 = Color32::from_rgb(0, 255, 0);
const GOLD: Color32 = Color32::from_rgb(255, 217, 26);
const PANEL_FILL: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 200);

/// One built UI frame.
pub struct UiFrame {
    pub output: egui::FullOutput,
    /// Language chosen in the start panel this frame.
    pub picked_locale: Option<Locale>,
    /// The pointer is on the language picker, so a click must not capture.
    pub pointer_on_widget: bool,
}

/// Build the complete UI and return egui output
pub fn build_ui(egui_ctx: &Context, raw_input: egui::RawInput, hud: &HudState) -> UiFrame {
    let strings = hud.locale.strings();
    let mut picker = PickerState::default();

    let output = egui_ctx.run(raw_input, |ctx| {
        if hud.capturing {
            draw_crosshair(ctx);
        } else if hud.completion.is_none() {
            picker = draw_start_panel(ctx, strings, hud);
        }
        draw_hud(ctx, strings, hud);
        if let Some(notice) = hud.notice {
            draw_pickup_notice(ctx, strings, notice);
        }
        if let Some(result) = hud.completion {
            draw_completion(ctx, strings, result);
        }
    });

    UiFrame {
        output,
        picked_locale: picker.picked,
        pointer_on_widget: picker.busy,
    }
}

#[derive(Default)]
struct PickerState {
    picked: Option<Locale>,
    busy: bool,
}

fn draw_crosshair(ctx: &Context) {
    let painter = ctx.layer_painter(egui::LayerId::new(egui::Order::TOP, egui::Id::new("crosshair")));
    let center = ctx.available_rect().center();
    let size = 8.0;
    let stroke = egui::Stroke::new(1.0, NEON);
    painter.line_segment(
        [
            egui::Pos2::new(center.x - size, center.y),
            egui::Pos2::new(center.x + size, center.y),
        ],
        stroke,
    );
    painter.line_segment(
        [
            egui::Pos2::new(center.x, center.y - size),
            egui::Pos2::new(center.x, center.y + size),
        ],
        stroke,
    );
}

fn controls_text(strings: &'static Strings, mode: LocomotionMode) -> &'static str {
    match mode {
        LocomotionMode::FreeFlight => strings.controls_flight,
        LocomotionMode::Grounded => strings.controls_grounded,
    }
}

fn draw_start_panel(ctx: &Context, strings: &'static Strings, hud: &HudState) -> PickerState {
    let mut state = PickerState::default();
    egui::Area::new(egui::Id::new("start_panel"))
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            egui::Frame::NONE
                .fill(PANEL_FILL)
                .stroke(egui::Stroke::new(1.0, NEON))
                .inner_margin(16.0)
                .show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.label(RichText::new(strings.title).size(32.0).color(NEON).strong());
                        ui.add_space(8.0);
                        ui.label(RichText::new(strings.click_to_start).size(18.0).color(Color32::WHITE));
                        ui.add_space(8.0);
                        for line in controls_text(strings, hud.mode).split(" · ") {
                            ui.label(RichText::new(line).small().color(Color32::LIGHT_GRAY));
                        }
                        ui.add_space(8.0);
                        ui.horizontal(|ui| {
                            ui.label(RichText::new(strings.language).color(Color32::WHITE));
                            let mut selected = hud.locale;
                            let combo = egui::ComboBox::from_id_salt("language")
                                .selected_text(selected.native_name())
                                .show_ui(ui, |ui| {
                                    for locale in Locale::ALL {
                                        ui.selectable_value(&mut selected, locale, locale.native_name());
                                    }
                                });
                            state.busy = combo.response.hovered() || combo.inner.is_some();
                            if selected != hud.locale {
                                state.picked = Some(selected);
                            }
                        });
                    });
                });
        });
    state
}

fn turbo_label(strings: &'static Strings, phase: TurboPhase) -> Option<(&'static str, Color32)> {
    match phase {
        TurboPhase::Idle => None,
        TurboPhase::Active => Some((strings.turbo_active, Color32::from_rgb(0, 255, 255))),
        TurboPhase::Cooldown => Some((strings.turbo_cooldown, Color32::GRAY)),
    }
}

fn draw_hud(ctx: &Context, strings: &'static Strings, hud: &HudState) {
    egui::Area::new(egui::Id::new("hud"))
        .anchor(Align2::LEFT_TOP, [12.0, 12.0])
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::NONE.fill(PANEL_FILL).inner_margin(8.0).show(ui, |ui| {
                ui.label(
                    RichText::new(format!("{}: {}", strings.time, format_seconds(hud.elapsed)))
                        .monospace()
                        .color(NEON),
                );
                ui.label(
                    RichText::new(format!("{}: {}", strings.best_time, format_seconds(hud.best)))
                        .monospace()
                        .color(NEON),
                );
                ui.label(
                    RichText::new(format!("{}: {}/{}", strings.collected, hud.collected, hud.total))
                        .monospace()
                        .color(GOLD),
                );
                if let Some((text, color)) = turbo_label(strings, hud.turbo) {
                    ui.label(RichText::new(text).monospace().strong().color(color));
                }
            });
        });
}

fn draw_pickup_notice(ctx: &Context, strings: &'static Strings, notice: PickupNotice) {
    egui::Area::new(egui::Id::new("pickup_notice"))
        .anchor(Align2::CENTER_TOP, [0.0, 80.0])
        .interactable(false)
        .show(ctx, |ui| {
            ui.label(
                RichText::new(format!("{} {}/{}", strings.picked_up, notice.collected, notice.total))
                    .size(22.0)
                    .strong()
                    .color(GOLD),
            );
        });
}

fn draw_completion(ctx: &Context, strings: &'static Strings, result: RunResult) {
    egui::Area::new(egui::Id::new("completion"))
        .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
        .interactable(false)
        .show(ctx, |ui| {
            egui::Frame::NONE
                .fill(PANEL_FILL)
                .stroke(egui::Stroke::new(2.0, GOLD))
                .inner_margin(20.0)
                .show(ui, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.label(RichText::new(strings.complete).size(30.0).strong().color(GOLD));
                        ui.add_space(6.0);
                        ui.label(
                            RichText::new(format!("{}: {}", strings.finish_time, format_seconds(Some(result.time))))
                                .size(18.0)
                                .color(Color32::WHITE),
                        );
                        ui.label(
                            RichText::new(format!("{}: {}", strings.best_time, format_seconds(Some(result.best))))
                                .size(18.0)
                                .color(Color32::WHITE),
                        );
                        if result.new_record {
                            ui.label(RichText::new(strings.new_record).size(20.0).strong().color(NEON));
                        }
                        ui.add_space(6.0);
                        ui.label(RichText::new(strings.restart_hint).color(Color32::LIGHT_GRAY));
                    });
                });
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hud(capturing: bool) -> HudState {
        HudState {
            capturing,
            mode: LocomotionMode::FreeFlight,
            locale: Locale::Es,
            elapsed: Some(3.5),
            best: None,
            collected: 2,
            total: 10,
            turbo: TurboPhase::Active,
            notice: Some(PickupNotice { collected: 2, total: 10 }),
            completion: None,
        }
    }

    fn raw_input() -> egui::RawInput {
        egui::RawInput {
            screen_rect: Some(egui::Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800.0, 600.0))),
            ..Default::default()
        }
    }

    #[test]
    fn hud_frame_produces_shapes_without_picking_a_language() {
        let ctx = Context::default();
        let frame = build_ui(&ctx, raw_input(), &hud(true));
        assert!(!frame.output.shapes.is_empty());
        assert_eq!(frame.picked_locale, None);
        assert!(!frame.pointer_on_widget);
    }

    #[test]
    fn start_panel_and_completion_overlay_render() {
        let ctx = Context::default();
        let idle = build_ui(&ctx, raw_input(), &hud(false));
        assert!(!idle.output.shapes.is_empty());

        let mut done = hud(false);
        done.completion = Some(RunResult { time: 42.0, best: 42.0, new_record: true });
        let frame = build_ui(&ctx, raw_input(), &done);
        assert!(!frame.output.shapes.is_empty());
        assert_eq!(frame.picked_locale, None);
    }

    #[test]
    fn turbo_label_hidden_while_idle() {
        let strings = Locale::En.strings();
        assert!(turbo_label(strings, TurboPhase::Idle).is_none());
        assert_eq!(turbo_label(strings, TurboPhase::Cooldown).map(|l| l.0), Some(strings.turbo_cooldown));
    }
}
