//! Chat panel — conversation view, tool-call bubbles, artifact rail, input.

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};
use serde_json::{json, Value};

use dandori_core::store::ChatStore;
use dandori_types::course::CourseView;
use dandori_types::message::{ChatMessage, Role};
use dandori_types::tool::{ToolEvent, ToolStatus};

use crate::state::UiState;
use crate::theme::*;

const SUGGESTED_PROMPTS: &[&str] = &[
    "Find me a relaxing weekend class",
    "What pottery courses are available?",
    "Show me classes under £50",
    "Recommend something creative for beginners",
];

const MAX_TOOL_RESULT_ROWS: usize = 10;

/// Render the chat experience. Returns Some(message) when the user submits.
pub fn chat_panel(ui: &mut egui::Ui, state: &mut UiState, store: &ChatStore) -> Option<String> {
    let mut submitted = None;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                // Header
                ui.horizontal(|ui| {
                    ui.heading(
                        RichText::new("Dandori Assistant")
                            .color(TEXT_PRIMARY)
                            .strong(),
                    );
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let (status, color) = if store.is_loading() {
                            ("Thinking...", WARNING)
                        } else {
                            ("Ready to help", SUCCESS)
                        };
                        ui.label(RichText::new(status).color(color).small());
                    });
                });

                ui.separator();

                // Messages area
                let available_height = ui.available_height() - 60.0;
                ScrollArea::vertical()
                    .max_height(available_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        if store.messages().is_empty() {
                            render_welcome(ui, state);
                        } else {
                            for message in store.messages() {
                                if message.role == Role::Assistant {
                                    render_tool_bubbles(ui, state, store, &message.id);
                                }
                                render_message(ui, message);
                                ui.add_space(4.0);
                            }
                        }

                        if !store.artifacts().is_empty() {
                            render_artifact_rail(ui, store);
                        }
                    });

                ui.add_space(8.0);

                // Input row
                ui.horizontal(|ui| {
                    let input = egui::TextEdit::singleline(&mut state.input_text)
                        .hint_text("Ask about courses, locations, or your interests...")
                        .desired_width(ui.available_width() - 70.0)
                        .font(egui::FontId::proportional(14.0));

                    let response = ui.add_enabled(!store.is_loading(), input);

                    let send_enabled =
                        !state.input_text.trim().is_empty() && !store.is_loading();
                    let send_btn = ui.add_enabled(
                        send_enabled,
                        egui::Button::new(RichText::new("Send").color(TEXT_PRIMARY))
                            .fill(if send_enabled { ACCENT } else { BG_SURFACE })
                            .corner_radius(PANEL_ROUNDING)
                            .min_size(Vec2::new(60.0, 0.0)),
                    );

                    if (response.lost_focus()
                        && ui.input(|i| i.key_pressed(egui::Key::Enter))
                        && send_enabled)
                        || send_btn.clicked()
                    {
                        submitted = Some(state.input_text.trim().to_string());
                        state.input_text.clear();
                        response.request_focus();
                    }
                });
            });
        });

    submitted
}

fn render_welcome(ui: &mut egui::Ui, state: &mut UiState) {
    ui.add_space(24.0);
    ui.vertical_centered(|ui| {
        ui.heading(RichText::new("Welcome to Dandori").color(TEXT_PRIMARY));
        ui.label(
            RichText::new(
                "I'm here to help you discover the perfect course for your \
                 journey of joy and wellbeing. Ask me anything!",
            )
            .color(TEXT_SECONDARY),
        );
        ui.add_space(12.0);
        for prompt in SUGGESTED_PROMPTS {
            if ui
                .add(
                    egui::Button::new(RichText::new(*prompt).color(TEXT_PRIMARY))
                        .fill(BG_SECONDARY)
                        .corner_radius(PANEL_ROUNDING),
                )
                .clicked()
            {
                state.input_text = prompt.to_string();
            }
        }
    });
}

fn render_message(ui: &mut egui::Ui, message: &ChatMessage) {
    let (label, label_color, bg) = match (message.role, message.is_error) {
        (_, true) => ("Assistant", ERROR, ERROR_BUBBLE_BG),
        (Role::User, _) => ("You", ACCENT, BG_SECONDARY),
        (Role::Assistant, _) => ("Assistant", SUCCESS, BG_SECONDARY),
        (Role::System, _) => ("System", TEXT_SECONDARY, BG_SURFACE),
    };

    egui::Frame::default()
        .fill(bg)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.label(RichText::new(label).color(label_color).strong().small());
            if message.is_streaming && message.content.is_empty() {
                ui.label(RichText::new("● ● ●").color(TEXT_SECONDARY));
            } else {
                ui.label(RichText::new(&message.content).color(TEXT_PRIMARY));
            }
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(message.timestamp.format("%H:%M").to_string())
                        .color(TEXT_SECONDARY)
                        .small(),
                );
                if let Some(meta) = &message.metadata {
                    if let Some(model) = &meta.model {
                        ui.label(RichText::new(model).color(TEXT_SECONDARY).small());
                    }
                }
            });
        });
}

fn render_tool_bubbles(ui: &mut egui::Ui, state: &mut UiState, store: &ChatStore, message_id: &str) {
    let events: Vec<&ToolEvent> = store
        .tool_events()
        .iter()
        .filter(|e| e.message_id == message_id)
        .collect();

    for event in events {
        let courses = normalize_courses(event);
        let has_courses = !courses.is_empty();
        let expanded = state.expanded_tools.contains(&event.id);

        egui::Frame::default()
            .fill(BG_SURFACE)
            .corner_radius(PANEL_ROUNDING)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let (glyph, color) = match event.status {
                        ToolStatus::Running => ("⚒", WARNING),
                        ToolStatus::Completed => ("✔", SUCCESS),
                        ToolStatus::Error => ("⚠", ERROR),
                    };
                    ui.label(RichText::new(glyph).color(color));

                    let mut header = format_tool_name(&event.name);
                    if let Some(query) = extract_tool_query(&event.arguments) {
                        header.push_str(&format!(" — {}", query));
                    }
                    if has_courses {
                        header.push_str(&format!(
                            "  ({} course{} found)",
                            courses.len(),
                            if courses.len() == 1 { "" } else { "s" }
                        ));
                        if ui
                            .selectable_label(expanded, RichText::new(header).color(TEXT_PRIMARY))
                            .clicked()
                        {
                            state.toggle_tool_expanded(&event.id);
                        }
                    } else {
                        ui.label(RichText::new(header).color(TEXT_PRIMARY));
                    }
                });

                if expanded && has_courses {
                    for course in courses.iter().take(MAX_TOOL_RESULT_ROWS) {
                        let view = CourseView::from_value(course);
                        let label = view.title.as_deref().unwrap_or("Untitled match");
                        ui.label(RichText::new(format!("• {}", label)).color(TEXT_SECONDARY));
                    }
                }
            });
        ui.add_space(2.0);
    }
}

fn render_artifact_rail(ui: &mut egui::Ui, store: &ChatStore) {
    ui.add_space(8.0);
    ui.label(
        RichText::new("Recommended Courses")
            .color(TEXT_PRIMARY)
            .strong(),
    );
    for artifact in store.artifacts() {
        let view = CourseView::from_value(&artifact.course);
        egui::Frame::default()
            .fill(BG_SECONDARY)
            .corner_radius(PANEL_ROUNDING)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(
                    RichText::new(view.title.as_deref().unwrap_or("Untitled course"))
                        .color(TEXT_PRIMARY)
                        .strong(),
                );
                let mut details = Vec::new();
                if let Some(instructor) = &view.instructor {
                    details.push(instructor.clone());
                }
                if let Some(location) = &view.location {
                    details.push(location.clone());
                }
                if let Some(cost) = view.cost_value() {
                    details.push(format!("£{:.0}", cost));
                }
                if !details.is_empty() {
                    ui.label(
                        RichText::new(details.join("  ·  "))
                            .color(TEXT_SECONDARY)
                            .small(),
                    );
                }
            });
        ui.add_space(2.0);
    }
}

// ─── Tool payload helpers ────────────────────────────────────

/// "search_courses" → "Search Courses"
pub fn format_tool_name(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pull a human-readable query out of a tool call's arguments:
/// `query` or `value` when present, else the first populated filter entry.
pub fn extract_tool_query(arguments: &Value) -> Option<String> {
    for key in ["query", "value"] {
        if let Some(text) = arguments.get(key).and_then(|v| v.as_str()) {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }

    let filters = arguments.get("filters")?.as_object()?;
    for (key, value) in filters {
        match value {
            Value::Array(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .filter(|v| !v.is_null())
                    .map(display_value)
                    .filter(|s| !s.is_empty())
                    .collect();
                if !parts.is_empty() {
                    return Some(format!("{}: {}", key, parts.join(", ")));
                }
            }
            Value::Null => {}
            Value::String(s) if s.is_empty() => {}
            other => return Some(format!("{}: {}", key, display_value(other))),
        }
    }
    None
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Extract displayable course records from a tool result.
///
/// SQL-backed tools return `result.courses` (or a single `result.course`),
/// sometimes with each row wrapped as `{course: {...}}`. Semantic-search
/// tools return parallel `metadatas`/`ids` rows instead, which are rebuilt
/// into course-shaped objects here.
pub fn normalize_courses(event: &ToolEvent) -> Vec<Value> {
    let Some(result) = &event.result else {
        return Vec::new();
    };

    let direct: Vec<Value> = match result.get("courses") {
        Some(Value::Array(list)) => list.clone(),
        _ => match result.get("course") {
            Some(course) if course.is_object() => vec![course.clone()],
            _ => Vec::new(),
        },
    };

    if !direct.is_empty() {
        return direct
            .iter()
            .filter_map(|row| {
                let course = match row.get("course") {
                    Some(inner) if inner.is_object() => inner,
                    _ => row,
                };
                course.is_object().then(|| course.clone())
            })
            .collect();
    }

    let metadatas = flatten_rows(result.get("metadatas"));
    if metadatas.is_empty() {
        return Vec::new();
    }
    let ids = flatten_rows(result.get("ids"));

    metadatas
        .iter()
        .enumerate()
        .filter_map(|(index, meta)| {
            let obj = meta.as_object()?;
            let course_id = obj
                .get("course_id")
                .or_else(|| obj.get("id"))
                .cloned()
                .or_else(|| ids.get(index).cloned());
            let title = obj
                .get("title")
                .or_else(|| obj.get("class_id"))
                .and_then(|v| v.as_str())
                .map(String::from)
                .unwrap_or_else(|| format!("Match {}", index + 1));
            let id = course_id
                .clone()
                .unwrap_or_else(|| json!(format!("semantic-{}-{}", event.id, index)));
            Some(json!({
                "title": title,
                "instructor": obj.get("instructor"),
                "location": obj.get("location"),
                "course_id": course_id,
                "id": id,
            }))
        })
        .collect()
}

/// Vector-search responses nest their rows one array deep; unwrap that.
fn flatten_rows(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(rows)) => match rows.first() {
            Some(Value::Array(inner)) => inner.clone(),
            _ => rows.clone(),
        },
        _ => Vec::new(),
    }
}
