//! Settings panel — sign in / sign out and profile context.

use egui::{self, RichText};

use dandori_types::course::{Credentials, UserProfile};

use crate::state::UiState;
use crate::theme::*;

/// What the caller should do after rendering the settings panel
pub enum SettingsAction {
    None,
    Login(Credentials),
    Signup(Credentials),
    Logout,
    SaveProfile(UserProfile),
}

pub fn settings_panel(ui: &mut egui::Ui, state: &mut UiState) -> SettingsAction {
    let mut action = SettingsAction::None;

    ui.heading(RichText::new("Account").color(TEXT_PRIMARY).strong());
    ui.separator();

    match &mut state.profile {
        Some(profile) => {
            ui.label(
                RichText::new(profile.email.as_deref().unwrap_or("Signed in"))
                    .color(TEXT_SECONDARY)
                    .small(),
            );
            ui.add_space(8.0);

            ui.label(RichText::new("Name").color(TEXT_SECONDARY).small());
            let mut name = profile.name.clone().unwrap_or_default();
            if ui.text_edit_singleline(&mut name).changed() {
                profile.name = (!name.is_empty()).then_some(name);
            }

            ui.label(RichText::new("Bio").color(TEXT_SECONDARY).small());
            let mut bio = profile.bio.clone().unwrap_or_default();
            if ui.text_edit_multiline(&mut bio).changed() {
                profile.bio = (!bio.is_empty()).then_some(bio);
            }

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Save profile").clicked() {
                    action = SettingsAction::SaveProfile(profile.clone());
                }
                if ui.button("Sign out").clicked() {
                    action = SettingsAction::Logout;
                }
            });
        }
        None => {
            ui.label(RichText::new("Email").color(TEXT_SECONDARY).small());
            ui.text_edit_singleline(&mut state.login_email);

            ui.label(RichText::new("Password").color(TEXT_SECONDARY).small());
            ui.add(egui::TextEdit::singleline(&mut state.login_password).password(true));

            ui.add_space(8.0);
            let ready =
                !state.login_email.trim().is_empty() && !state.login_password.is_empty();
            ui.horizontal(|ui| {
                if ui.add_enabled(ready, egui::Button::new("Sign in")).clicked() {
                    action = SettingsAction::Login(Credentials {
                        email: state.login_email.trim().to_string(),
                        password: state.login_password.clone(),
                    });
                }
                if ui.add_enabled(ready, egui::Button::new("Sign up")).clicked() {
                    action = SettingsAction::Signup(Credentials {
                        email: state.login_email.trim().to_string(),
                        password: state.login_password.clone(),
                    });
                }
            });
        }
    }

    if let Some(feedback) = &state.auth_feedback {
        ui.add_space(8.0);
        ui.label(RichText::new(feedback).color(WARNING).small());
    }

    if !state.api_base.is_empty() {
        ui.add_space(12.0);
        ui.label(
            RichText::new(format!("Server: {}", state.api_base))
                .color(TEXT_SECONDARY)
                .small(),
        );
    }

    action
}
