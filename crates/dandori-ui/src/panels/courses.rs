//! Course discovery panel — search box, filters, result grid.

use egui::{self, RichText, ScrollArea};
use serde_json::Value;

use dandori_types::course::CourseView;

use crate::state::{CourseFilters, SortBy, UiState, DEFAULT_PRICE_RANGE};
use crate::theme::*;

/// Render the courses view. Returns Some(query) when the user runs a search.
pub fn courses_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<String> {
    let mut submitted = None;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.heading(RichText::new("Discover Courses").color(TEXT_PRIMARY).strong());
            ui.separator();

            // Search row
            ui.horizontal(|ui| {
                let input = egui::TextEdit::singleline(&mut state.search_query)
                    .hint_text("Search courses...")
                    .desired_width(ui.available_width() - 90.0);
                let response = ui.add_enabled(!state.is_searching, input);

                let go = ui.add_enabled(
                    !state.search_query.trim().is_empty() && !state.is_searching,
                    egui::Button::new(RichText::new("Search").color(TEXT_PRIMARY))
                        .fill(ACCENT)
                        .corner_radius(PANEL_ROUNDING),
                );
                if go.clicked()
                    || (response.lost_focus()
                        && ui.input(|i| i.key_pressed(egui::Key::Enter))
                        && !state.search_query.trim().is_empty())
                {
                    submitted = Some(state.search_query.trim().to_string());
                }
            });

            // Filter row
            ui.horizontal(|ui| {
                ui.label(RichText::new("Location").color(TEXT_SECONDARY).small());
                ui.add(
                    egui::TextEdit::singleline(&mut state.filters.location)
                        .desired_width(100.0),
                );
                ui.label(RichText::new("Type").color(TEXT_SECONDARY).small());
                ui.add(
                    egui::TextEdit::singleline(&mut state.filters.course_type)
                        .desired_width(100.0),
                );
                ui.label(RichText::new("Max £").color(TEXT_SECONDARY).small());
                ui.add(
                    egui::Slider::new(
                        &mut state.filters.price_range.1,
                        DEFAULT_PRICE_RANGE.0..=DEFAULT_PRICE_RANGE.1,
                    )
                    .show_value(true),
                );

                egui::ComboBox::from_id_salt("sort_by")
                    .selected_text(state.filters.sort_by.label())
                    .show_ui(ui, |ui| {
                        for sort in SortBy::all() {
                            ui.selectable_value(&mut state.filters.sort_by, *sort, sort.label());
                        }
                    });
            });

            ui.separator();

            let visible = apply_filters(&state.courses, &state.filters);
            if state.is_searching {
                ui.label(RichText::new("Searching...").color(TEXT_SECONDARY));
            } else if visible.is_empty() {
                ui.label(RichText::new("No courses to show yet.").color(TEXT_SECONDARY));
            }

            ScrollArea::vertical().auto_shrink([false, false]).show(ui, |ui| {
                for course in &visible {
                    render_course_card(ui, course);
                    ui.add_space(4.0);
                }
            });
        });

    submitted
}

fn render_course_card(ui: &mut egui::Ui, course: &Value) {
    let view = CourseView::from_value(course);
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
            ui.horizontal(|ui| {
                if let Some(instructor) = &view.instructor {
                    ui.label(RichText::new(instructor).color(TEXT_SECONDARY).small());
                }
                if let Some(location) = &view.location {
                    ui.label(RichText::new(location).color(TEXT_SECONDARY).small());
                }
                if let Some(cost) = view.cost_value() {
                    ui.label(RichText::new(format!("£{:.0}", cost)).color(ACCENT).small());
                }
                let rating = view.rating_value();
                if rating > 0.0 {
                    ui.label(
                        RichText::new(format!("★ {:.1}", rating))
                            .color(WARNING)
                            .small(),
                    );
                }
            });
        });
}

/// Client-side filtering and sorting over a fetched course list.
/// Filters are substring matches; the price filter only engages once the
/// range is narrowed from the default.
pub fn apply_filters(courses: &[Value], filters: &CourseFilters) -> Vec<Value> {
    let location = filters.location.trim().to_lowercase();
    let course_type = filters.course_type.trim().to_lowercase();
    let (min_price, max_price) = filters.price_range;
    let price_filter_active =
        min_price > DEFAULT_PRICE_RANGE.0 || max_price < DEFAULT_PRICE_RANGE.1;

    let mut filtered: Vec<Value> = courses
        .iter()
        .filter(|course| {
            let view = CourseView::from_value(course);
            let matches_location = location.is_empty()
                || view
                    .location
                    .as_deref()
                    .map(|l| l.to_lowercase().contains(&location))
                    .unwrap_or(false);
            let matches_type = course_type.is_empty()
                || view
                    .course_type
                    .as_deref()
                    .map(|t| t.to_lowercase().contains(&course_type))
                    .unwrap_or(false);
            let matches_price = !price_filter_active
                || view
                    .cost_value()
                    .map(|c| c >= min_price && c <= max_price)
                    .unwrap_or(false);
            matches_location && matches_type && matches_price
        })
        .cloned()
        .collect();

    match filters.sort_by {
        SortBy::Relevance => {}
        SortBy::PriceLow => filtered.sort_by(|a, b| {
            let cost_a = CourseView::from_value(a).cost_value().unwrap_or(f64::INFINITY);
            let cost_b = CourseView::from_value(b).cost_value().unwrap_or(f64::INFINITY);
            cost_a.total_cmp(&cost_b)
        }),
        SortBy::PriceHigh => filtered.sort_by(|a, b| {
            let cost_a = CourseView::from_value(a)
                .cost_value()
                .unwrap_or(f64::NEG_INFINITY);
            let cost_b = CourseView::from_value(b)
                .cost_value()
                .unwrap_or(f64::NEG_INFINITY);
            cost_b.total_cmp(&cost_a)
        }),
        SortBy::Rating => filtered.sort_by(|a, b| {
            let rating_a = CourseView::from_value(a).rating_value();
            let rating_b = CourseView::from_value(b).rating_value();
            rating_b.total_cmp(&rating_a)
        }),
    }

    filtered
}
