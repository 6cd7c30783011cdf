use std::collections::{HashMap, HashSet};

use client_core::{
    view::{self, Action, Card, Header, ViewTree},
    ViewState,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;
use shared::{
    domain::UserKey,
    error::{ErrorKind, Failure},
};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorCategory, UiEvent};
use crate::controller::orchestration::{command_for_action, dispatch_backend_command};
use crate::ui::theme::{self, DirectoryPalette};

const CARD_IMAGE_HEIGHT: f32 = 140.0;
const CARD_INNER_MARGIN: i8 = 8;
const LOGO_SIZE: f32 = 28.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Error,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    message: String,
}

enum AvatarState {
    Loading,
    Ready(TextureHandle),
    Failed(String),
}

fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Network => "Network",
        UiErrorCategory::Data => "Data",
        UiErrorCategory::Storage => "Storage",
        UiErrorCategory::Unknown => "Error",
    }
}

fn banner_message(err: &UiError) -> String {
    format!(
        "[{}] {}: {}",
        err_label(err.category()),
        err.context().label(),
        err.message()
    )
}

pub struct DirectoryApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    view: ViewState,
    startup_failure: Option<Failure>,
    status: String,
    status_banner: Option<StatusBanner>,
    avatars: HashMap<UserKey, AvatarState>,
    palette: DirectoryPalette,
    theme_applied: bool,
}

impl DirectoryApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            view: ViewState::default(),
            startup_failure: None,
            status: "Starting".to_string(),
            status_banner: None,
            avatars: HashMap::new(),
            palette: DirectoryPalette::default(),
            theme_applied: false,
        }
    }

    fn process_ui_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::ViewChanged(state) => {
                    self.startup_failure = None;
                    self.status = format!(
                        "{} - {}",
                        state.phase().label(),
                        view::count_label(state.count())
                    );
                    self.view = state;
                    self.prune_avatars();
                }
                UiEvent::StartupFailed(failure) => {
                    self.status = format!("Startup failed: {}", failure.message);
                    self.startup_failure = Some(failure);
                }
                UiEvent::Error(err) => {
                    tracing::warn!(
                        category = ?err.category(),
                        context = ?err.context(),
                        "backend error: {}",
                        err.message()
                    );
                    self.status = err.message().to_string();
                    self.status_banner = Some(StatusBanner {
                        severity: StatusBannerSeverity::Error,
                        message: banner_message(&err),
                    });
                }
                UiEvent::AvatarLoaded { id, image } => {
                    if !self.is_shown(&id) {
                        continue;
                    }
                    let color_image = egui::ColorImage::from_rgba_unmultiplied(
                        [image.width, image.height],
                        &image.rgba,
                    );
                    let texture = ctx.load_texture(
                        format!("avatar:{id}"),
                        color_image,
                        egui::TextureOptions::LINEAR,
                    );
                    self.avatars.insert(id, AvatarState::Ready(texture));
                }
                UiEvent::AvatarFailed { id, reason } => {
                    tracing::debug!(user_id = %id, "avatar unavailable: {reason}");
                    if !self.is_shown(&id) {
                        continue;
                    }
                    self.avatars.insert(id, AvatarState::Failed(reason));
                }
            }
        }
    }

    fn is_shown(&self, id: &UserKey) -> bool {
        self.view.users().iter().any(|user| &user.id == id)
    }

    fn prune_avatars(&mut self) {
        let live: HashSet<&UserKey> = self.view.users().iter().map(|user| &user.id).collect();
        self.avatars.retain(|id, _| live.contains(id));
    }

    fn current_tree(&self) -> ViewTree {
        match &self.startup_failure {
            Some(failure) => ViewTree::LoadFailed {
                kind: failure.kind,
                message: failure.message.clone(),
                retry: Action::Retry,
            },
            None => view::render(&self.view),
        }
    }

    /// Avatar entries stay until the snapshot without the user arrives and `prune_avatars` runs.
    fn dispatch(&mut self, action: Action) {
        let cmd = command_for_action(action);
        if !dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) {
            self.status_banner = Some(StatusBanner {
                severity: StatusBannerSeverity::Error,
                message: self.status.clone(),
            });
        }
    }

    fn request_avatar(&mut self, card: &Card) {
        if self.avatars.contains_key(&card.id) {
            return;
        }
        let cmd = BackendCommand::FetchAvatar {
            id: card.id.clone(),
            url: card.image.clone(),
        };
        let state = if dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) {
            AvatarState::Loading
        } else {
            AvatarState::Failed("avatar request was not queued".to_string())
        };
        self.avatars.insert(card.id.clone(), state);
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        let palette = self.palette;
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.show_status_banner(ui);
            ui.label(
                egui::RichText::new(&self.status)
                    .small()
                    .color(palette.muted_text),
            );
        });
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            let (fill, stroke) = match banner.severity {
                StatusBannerSeverity::Error => (
                    egui::Color32::from_rgb(253, 236, 234),
                    egui::Stroke::new(1.0, egui::Color32::from_rgb(229, 115, 115)),
                ),
            };

            egui::Frame::NONE
                .fill(fill)
                .stroke(stroke)
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(egui::RichText::new(&banner.message).color(self.palette.danger));
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
        }
    }

    fn show_loading(&self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.centered_and_justified(|ui| {
                ui.add(egui::Spinner::new().size(48.0).color(self.palette.accent));
            });
        });
    }

    fn show_header(&self, ctx: &egui::Context, header: &Header, actions: &mut Vec<Action>) {
        let palette = self.palette;
        let frame = egui::Frame::NONE
            .fill(palette.header_background)
            .stroke(egui::Stroke::new(1.0, palette.header_stroke))
            .inner_margin(egui::Margin::symmetric(16, 10));

        egui::TopBottomPanel::top("directory_header")
            .frame(frame)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    theme::paint_logo(ui, palette, LOGO_SIZE);
                    ui.heading(header.title);
                    egui::Frame::NONE
                        .fill(palette.accent.gamma_multiply(0.12))
                        .corner_radius(12.0)
                        .inner_margin(egui::Margin::symmetric(10, 4))
                        .show(ui, |ui| {
                            ui.label(egui::RichText::new(&header.count_label).color(palette.accent));
                        });
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("Refresh").clicked() {
                            actions.push(header.refresh.clone());
                        }
                    });
                });
            });
    }

    fn show_grid(&mut self, ctx: &egui::Context, cards: &[Card], actions: &mut Vec<Action>) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let width = ui.available_width();
            let per_row = view::cards_per_row(width).max(1);
            let spacing = view::grid_spacing(width);
            let card_width =
                ((width - spacing * (per_row as f32 - 1.0)) / per_row as f32).max(96.0);

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.spacing_mut().item_spacing = egui::vec2(spacing, spacing);
                    ui.add_space(spacing);
                    for row in cards.chunks(per_row) {
                        ui.horizontal_top(|ui| {
                            for card in row {
                                self.show_card(ui, card, card_width, actions);
                            }
                        });
                    }
                });
        });
    }

    fn show_card(&mut self, ui: &mut egui::Ui, card: &Card, width: f32, actions: &mut Vec<Action>) {
        self.request_avatar(card);
        let palette = self.palette;
        let content_width = width - 2.0 * f32::from(CARD_INNER_MARGIN) - 2.0;

        egui::Frame::NONE
            .fill(palette.card_background)
            .stroke(egui::Stroke::new(1.0, palette.card_stroke))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::same(CARD_INNER_MARGIN))
            .show(ui, |ui| {
                ui.set_width(content_width);
                ui.vertical_centered(|ui| {
                    let image_size = egui::vec2(content_width, CARD_IMAGE_HEIGHT);
                    match self.avatars.get(&card.id) {
                        Some(AvatarState::Ready(texture)) => {
                            ui.add(
                                egui::Image::from_texture(egui::load::SizedTexture::from_handle(
                                    texture,
                                ))
                                .fit_to_exact_size(image_size)
                                .corner_radius(6.0),
                            );
                        }
                        Some(AvatarState::Failed(reason)) => {
                            let (rect, response) =
                                ui.allocate_exact_size(image_size, egui::Sense::hover());
                            ui.painter().rect_filled(rect, 6.0, palette.header_background);
                            response.on_hover_text(reason.as_str());
                        }
                        Some(AvatarState::Loading) | None => {
                            let (rect, _) =
                                ui.allocate_exact_size(image_size, egui::Sense::hover());
                            ui.painter().rect_filled(rect, 6.0, palette.header_background);
                            ui.put(
                                egui::Rect::from_center_size(rect.center(), egui::vec2(20.0, 20.0)),
                                egui::Spinner::new(),
                            );
                        }
                    }

                    ui.label(egui::RichText::new(&card.name).strong());
                    let delete =
                        egui::Button::new(egui::RichText::new("Delete").color(palette.danger));
                    if ui.add(delete).clicked() {
                        actions.push(card.delete.clone());
                    }
                });
            });
    }

    fn show_failure(
        &self,
        ctx: &egui::Context,
        kind: ErrorKind,
        message: &str,
        retry: Action,
        actions: &mut Vec<Action>,
    ) {
        let palette = self.palette;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(ui.available_height() * 0.3);
                ui.heading("Could not load users");
                ui.label(egui::RichText::new(kind.label()).color(palette.muted_text));
                ui.label(egui::RichText::new(message).color(palette.danger));
                ui.add_space(12.0);
                if ui.button("Retry").clicked() {
                    actions.push(retry);
                }
            });
        });
    }
}

impl eframe::App for DirectoryApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            ctx.set_visuals(theme::visuals_for_palette(self.palette));
            self.theme_applied = true;
        }

        self.process_ui_events(ctx);
        self.show_status_bar(ctx);

        let mut actions = Vec::new();
        match self.current_tree() {
            ViewTree::Loading => self.show_loading(ctx),
            ViewTree::Directory { header, cards } => {
                self.show_header(ctx, &header, &mut actions);
                self.show_grid(ctx, &cards, &mut actions);
            }
            ViewTree::LoadFailed {
                kind,
                message,
                retry,
            } => self.show_failure(ctx, kind, &message, retry, &mut actions),
        }

        for action in actions {
            self.dispatch(action);
        }

        ctx.request_repaint_after(std::time::Duration::from_millis(100));
    }
}

#[cfg(test)]
#[path = "../tests/app_tests.rs"]
mod tests;
