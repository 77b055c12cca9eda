//! Main egui application — composes the panels and dispatches turns.

use std::cell::RefCell;
use std::rc::Rc;

use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};
use serde_json::Value;

use dandori_core::store::ChatStore;
use dandori_core::turn::run_chat_turn;
use dandori_platform::DandoriApi;
use dandori_types::course::{Credentials, UserProfile};
use dandori_ui::panels::{chat, courses, settings};
use dandori_ui::state::{UiState, View};
use dandori_ui::theme;

/// The main application state
pub struct DandoriApp {
    ui_state: UiState,
    store: Rc<RefCell<ChatStore>>,
    api: Rc<DandoriApi>,
    /// Async results land here and are drained each frame
    profile_slot: Rc<RefCell<Option<Option<UserProfile>>>>,
    search_slot: Rc<RefCell<Option<Vec<Value>>>>,
    feedback_slot: Rc<RefCell<Option<String>>>,
    last_revision: u64,
    first_frame: bool,
}

impl DandoriApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let api = Rc::new(DandoriApi::default());
        let profile_slot = Rc::new(RefCell::new(None));

        if api.is_authenticated() {
            Self::restore_profile(api.clone(), profile_slot.clone());
        }

        let mut ui_state = UiState::new();
        ui_state.api_base = api.base_url().to_string();

        Self {
            ui_state,
            store: Rc::new(RefCell::new(ChatStore::new())),
            api,
            profile_slot,
            search_slot: Rc::new(RefCell::new(None)),
            feedback_slot: Rc::new(RefCell::new(None)),
            last_revision: 0,
            first_frame: true,
        }
    }

    /// Fetch the signed-in profile for chat context (async)
    fn restore_profile(api: Rc<DandoriApi>, slot: Rc<RefCell<Option<Option<UserProfile>>>>) {
        wasm_bindgen_futures::spawn_local(async move {
            match api.profile().await {
                Ok(profile) => *slot.borrow_mut() = Some(Some(profile)),
                Err(e) => {
                    log::warn!("Profile fetch failed: {}", e);
                    *slot.borrow_mut() = Some(None);
                }
            }
        });
    }

    fn drain_slots(&mut self) {
        if let Some(profile) = self.profile_slot.borrow_mut().take() {
            self.ui_state.profile = profile;
        }
        if let Some(results) = self.search_slot.borrow_mut().take() {
            self.ui_state.courses = results;
            self.ui_state.is_searching = false;
        }
        if let Some(feedback) = self.feedback_slot.borrow_mut().take() {
            self.ui_state.auth_feedback = Some(feedback);
        }
    }
}

impl eframe::App for DandoriApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            self.first_frame = false;
        }

        self.drain_slots();

        // Poll the store's change counter; repaint when it moves and keep
        // repainting while a turn is streaming.
        {
            let store = self.store.borrow();
            if store.revision() != self.last_revision {
                self.last_revision = store.revision();
                ctx.request_repaint();
            }
            if store.is_loading() || self.ui_state.is_searching {
                ctx.request_repaint();
            }
        }

        // ── Top bar ──────────────────────────────────────────
        TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("Dandori")
                        .strong()
                        .color(theme::ACCENT)
                        .size(16.0),
                );
                ui.separator();
                for (view, label) in [(View::Chat, "Chat"), (View::Courses, "Courses")] {
                    if ui
                        .selectable_label(self.ui_state.view == view, label)
                        .clicked()
                    {
                        self.ui_state.view = view;
                    }
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .selectable_label(self.ui_state.show_settings, "Account")
                        .clicked()
                    {
                        self.ui_state.show_settings = !self.ui_state.show_settings;
                    }
                    if let Some(profile) = &self.ui_state.profile {
                        ui.label(
                            RichText::new(profile.name.as_deref().unwrap_or("Signed in"))
                                .color(theme::TEXT_SECONDARY)
                                .small(),
                        );
                    }
                });
            });
        });

        // ── Account side panel ───────────────────────────────
        if self.ui_state.show_settings {
            SidePanel::right("account_panel")
                .min_width(260.0)
                .max_width(340.0)
                .show(ctx, |ui| {
                    let action = settings::settings_panel(ui, &mut self.ui_state);
                    self.handle_settings_action(action, ctx);
                });
        }

        // ── Main content ─────────────────────────────────────
        CentralPanel::default().show(ctx, |ui| match self.ui_state.view {
            View::Chat => {
                let store = self.store.borrow();
                if let Some(text) = chat::chat_panel(ui, &mut self.ui_state, &store) {
                    drop(store);
                    self.dispatch_chat(text, ctx);
                }
            }
            View::Courses => {
                if let Some(query) = courses::courses_panel(ui, &mut self.ui_state) {
                    self.dispatch_search(query, ctx);
                }
            }
        });
    }
}

impl DandoriApp {
    /// Run one chat turn against the store (async)
    fn dispatch_chat(&mut self, text: String, ctx: &egui::Context) {
        if self.store.borrow().is_loading() {
            return;
        }
        let store = self.store.clone();
        let api = self.api.clone();
        let profile = self
            .ui_state
            .profile
            .as_ref()
            .and_then(|p| p.chat_context());
        let ctx = ctx.clone();

        wasm_bindgen_futures::spawn_local(async move {
            run_chat_turn(&store, api.as_ref(), &text, profile).await;
            ctx.request_repaint();
        });
    }

    /// Run a course search (async)
    fn dispatch_search(&mut self, query: String, ctx: &egui::Context) {
        self.ui_state.is_searching = true;
        let api = self.api.clone();
        let slot = self.search_slot.clone();
        let ctx = ctx.clone();

        wasm_bindgen_futures::spawn_local(async move {
            match api.search(&query).await {
                Ok(list) => *slot.borrow_mut() = Some(list.courses),
                Err(e) => {
                    log::warn!("Course search failed: {}", e);
                    *slot.borrow_mut() = Some(Vec::new());
                }
            }
            ctx.request_repaint();
        });
    }

    /// Sign in or sign up, then surface the resulting profile
    fn authenticate(&mut self, credentials: Credentials, signup: bool, ctx: &egui::Context) {
        let api = self.api.clone();
        let profile_slot = self.profile_slot.clone();
        let feedback_slot = self.feedback_slot.clone();
        let ctx = ctx.clone();
        self.ui_state.login_password.clear();
        self.ui_state.auth_feedback = None;

        wasm_bindgen_futures::spawn_local(async move {
            let result = if signup {
                api.signup(&credentials).await
            } else {
                api.login(&credentials).await
            };
            match result {
                Ok(response) => match response.user {
                    Some(user) => *profile_slot.borrow_mut() = Some(Some(user)),
                    // Some deployments return only a token; fetch the profile
                    None => DandoriApp::restore_profile(api, profile_slot),
                },
                Err(e) => *feedback_slot.borrow_mut() = Some(e.to_string()),
            }
            ctx.request_repaint();
        });
    }

    fn handle_settings_action(&mut self, action: settings::SettingsAction, ctx: &egui::Context) {
        match action {
            settings::SettingsAction::None => {}
            settings::SettingsAction::Login(credentials) => {
                self.authenticate(credentials, false, ctx);
            }
            settings::SettingsAction::Signup(credentials) => {
                self.authenticate(credentials, true, ctx);
            }
            settings::SettingsAction::Logout => {
                let api = self.api.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = api.logout().await {
                        log::warn!("Logout failed: {}", e);
                    }
                });
                self.ui_state.profile = None;
            }
            settings::SettingsAction::SaveProfile(profile) => {
                let api = self.api.clone();
                let feedback_slot = self.feedback_slot.clone();
                let ctx = ctx.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match api.update_profile(&profile).await {
                        Ok(_) => *feedback_slot.borrow_mut() = Some("Profile saved".to_string()),
                        Err(e) => *feedback_slot.borrow_mut() = Some(e.to_string()),
                    }
                    ctx.request_repaint();
                });
            }
        }
    }
}
