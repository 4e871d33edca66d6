//! egui layout: gallery strip on top, details on the right, viewer in the
//! middle.

use egui::{Color32, RichText, Sense, load::SizedTexture};
use renderer::Placeholder;

use crate::gallery::GalleryController;

const CARD_SIZE: [f32; 2] = [220.0, 56.0];
/// Wheel distance (points) that counts as one zoom step.
const ZOOM_POINTS_PER_STEP: f32 = 50.0;
const VIEWER_BG: Color32 = Color32::from_rgb(0x00, 0x8b, 0xa3);

pub fn draw(
    ctx: &egui::Context,
    gallery: &mut GalleryController,
    viewer_texture: Option<egui::TextureId>,
    fps: Option<f32>,
) {
    gallery_strip(ctx, gallery);
    details_panel(ctx, gallery);
    viewer_panel(ctx, gallery, viewer_texture);

    if let Some(fps) = fps {
        egui::Area::new(egui::Id::new("fps"))
            .anchor(egui::Align2::LEFT_BOTTOM, [8.0, -8.0])
            .show(ctx, |ui| {
                ui.label(RichText::new(format!("{fps:.0} fps")).monospace().color(Color32::WHITE));
            });
    }
}

fn gallery_strip(ctx: &egui::Context, gallery: &mut GalleryController) {
    egui::TopBottomPanel::top("gallery")
        .resizable(false)
        .show(ctx, |ui| {
            ui.add_space(6.0);
            let mut clicked = None;
            ui.horizontal(|ui| {
                if ui.button("◀").clicked() {
                    gallery.scroll_left();
                }

                let strip_width = (ui.available_width() - 32.0).max(0.0);
                let selected = gallery.selected();
                let output = egui::ScrollArea::horizontal()
                    .id_salt("gallery-strip")
                    .max_width(strip_width)
                    .horizontal_scroll_offset(gallery.strip().offset())
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            for (index, item) in gallery.items().iter().enumerate() {
                                let card = egui::Button::new(item.label())
                                    .selected(selected == Some(index));
                                if ui.add_sized(CARD_SIZE, card).clicked() {
                                    clicked = Some(index);
                                }
                            }
                        });
                    });

                let strip = gallery.strip_mut();
                strip.set_extent(output.content_size.x, output.inner_rect.width());
                strip.sync_from_user(output.state.offset.x);

                if ui.button("▶").clicked() {
                    gallery.scroll_right();
                }
            });
            ui.add_space(6.0);

            if let Some(index) = clicked {
                let outcome = gallery.activate(index);
                log::debug!("Gallery item {index} activated: {outcome:?}");
            }
        });
}

fn details_panel(ctx: &egui::Context, gallery: &GalleryController) {
    egui::SidePanel::right("details")
        .resizable(false)
        .exact_width(280.0)
        .show(ctx, |ui| {
            ui.add_space(12.0);
            let details = gallery.details();
            if details.title.is_empty() {
                ui.label(RichText::new("Select a piece from the gallery.").italics());
                return;
            }
            ui.heading(&details.title);
            ui.add_space(8.0);
            ui.label(&details.description);
        });
}

fn viewer_panel(
    ctx: &egui::Context,
    gallery: &mut GalleryController,
    viewer_texture: Option<egui::TextureId>,
) {
    egui::CentralPanel::default()
        .frame(egui::Frame::none().fill(VIEWER_BG))
        .show(ctx, |ui| {
            let rect = ui.available_rect_before_wrap();
            let ppp = ctx.pixels_per_point();
            let region = gallery.region_mut();
            region.set_size(
                (rect.width() * ppp).round() as u32,
                (rect.height() * ppp).round() as u32,
            );

            if region.session().is_some() {
                let Some(texture) = viewer_texture else {
                    ui.centered_and_justified(|ui| ui.spinner());
                    return;
                };
                let image = egui::Image::new(SizedTexture::new(texture, rect.size()))
                    .sense(Sense::click_and_drag());
                let response = ui.add(image);
                let zoom = if response.hovered() {
                    ui.input(|i| i.smooth_scroll_delta.y) / ZOOM_POINTS_PER_STEP
                } else {
                    0.0
                };

                if let Some(session) = region.session_mut() {
                    let controls = session.controls_mut();
                    if response.dragged() {
                        let delta = response.drag_delta();
                        controls.rotate(delta.x, delta.y, rect.height());
                    }
                    controls.dolly(zoom);
                }
            } else if let Some(placeholder) = region.placeholder() {
                message(ui, placeholder.message(), placeholder == Placeholder::Error);
            } else {
                message(ui, "Choose a piece to see it in 3D.", false);
            }
        });
}

fn message(ui: &mut egui::Ui, text: &str, is_error: bool) {
    let color = if is_error {
        Color32::from_rgb(0xff, 0xd0, 0xd0)
    } else {
        Color32::WHITE
    };
    ui.centered_and_justified(|ui| {
        ui.label(RichText::new(text).size(18.0).color(color));
    });
}
