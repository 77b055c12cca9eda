#[cfg(test)]
mod tests {
    use crate::panels::chat::{extract_tool_query, format_tool_name, normalize_courses};
    use crate::panels::courses::apply_filters;
    use crate::state::{CourseFilters, SortBy, UiState};

    use dandori_types::tool::ToolEvent;
    use serde_json::{json, Value};

    fn completed_tool(result: Value) -> ToolEvent {
        let mut event = ToolEvent::running(
            Some("t1".to_string()),
            "search_courses",
            json!({}),
            "m1",
        );
        event.result = Some(result);
        event
    }

    // ─── Tool Name / Query Formatting ────────────────────────

    #[test]
    fn test_format_tool_name() {
        assert_eq!(format_tool_name("search_courses"), "Search Courses");
        assert_eq!(format_tool_name("lookup"), "Lookup");
        assert_eq!(format_tool_name(""), "");
    }

    #[test]
    fn test_extract_tool_query_prefers_query() {
        let query = extract_tool_query(&json!({"query": " pottery ", "value": "other"}));
        assert_eq!(query.as_deref(), Some("pottery"));
    }

    #[test]
    fn test_extract_tool_query_falls_back_to_value() {
        let query = extract_tool_query(&json!({"query": "  ", "value": "weaving"}));
        assert_eq!(query.as_deref(), Some("weaving"));
    }

    #[test]
    fn test_extract_tool_query_from_filters() {
        let query = extract_tool_query(&json!({"filters": {"location": "London"}}));
        assert_eq!(query.as_deref(), Some("location: London"));
    }

    #[test]
    fn test_extract_tool_query_from_array_filter() {
        let query =
            extract_tool_query(&json!({"filters": {"days": ["sat", null, "sun"]}}));
        assert_eq!(query.as_deref(), Some("days: sat, sun"));
    }

    #[test]
    fn test_extract_tool_query_nothing_usable() {
        assert!(extract_tool_query(&json!({})).is_none());
        assert!(extract_tool_query(&json!({"filters": {"location": ""}})).is_none());
    }

    // ─── Course Normalization ────────────────────────────────

    #[test]
    fn test_normalize_courses_from_array() {
        let event = completed_tool(json!({"courses": [{"id": 5, "title": "Pottery"}]}));
        let courses = normalize_courses(&event);
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0]["title"], "Pottery");
    }

    #[test]
    fn test_normalize_courses_from_single_course() {
        let event = completed_tool(json!({"course": {"id": 2, "title": "Weaving"}}));
        let courses = normalize_courses(&event);
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0]["title"], "Weaving");
    }

    #[test]
    fn test_normalize_courses_unwraps_nested_rows() {
        let event =
            completed_tool(json!({"courses": [{"course": {"id": 3, "title": "Yoga"}}]}));
        let courses = normalize_courses(&event);
        assert_eq!(courses[0]["title"], "Yoga");
    }

    #[test]
    fn test_normalize_courses_semantic_rows() {
        let event = completed_tool(json!({
            "metadatas": [[{"title": "Pottery", "course_id": 7}, {"class_id": "c-2"}]],
            "ids": [["7", "c-2"]],
        }));
        let courses = normalize_courses(&event);
        assert_eq!(courses.len(), 2);
        assert_eq!(courses[0]["title"], "Pottery");
        assert_eq!(courses[0]["course_id"], 7);
        assert_eq!(courses[1]["title"], "c-2");
    }

    #[test]
    fn test_normalize_courses_no_result() {
        let event = ToolEvent::running(Some("t1".to_string()), "x", json!({}), "m1");
        assert!(normalize_courses(&event).is_empty());
    }

    #[test]
    fn test_normalize_courses_empty_result() {
        let event = completed_tool(json!({"courses": []}));
        assert!(normalize_courses(&event).is_empty());
    }

    // ─── Course Filtering ────────────────────────────────────

    fn sample_courses() -> Vec<Value> {
        vec![
            json!({"title": "Pottery", "location": "London", "course_type": "craft", "cost": 45, "rating": 4.5}),
            json!({"title": "Weaving", "location": "Bristol", "course_type": "craft", "cost": "£80", "rating": 4.9}),
            json!({"title": "Yoga", "location": "London", "course_type": "wellness", "cost": 20, "rating": 3.8}),
        ]
    }

    #[test]
    fn test_apply_filters_location_substring() {
        let mut filters = CourseFilters::default();
        filters.location = "lond".to_string();
        let visible = apply_filters(&sample_courses(), &filters);
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_apply_filters_course_type() {
        let mut filters = CourseFilters::default();
        filters.course_type = "wellness".to_string();
        let visible = apply_filters(&sample_courses(), &filters);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0]["title"], "Yoga");
    }

    #[test]
    fn test_apply_filters_price_only_when_narrowed() {
        // Default range filters nothing, even unpriced courses
        let mut courses = sample_courses();
        courses.push(json!({"title": "Mystery", "cost": "contact us"}));
        let visible = apply_filters(&courses, &CourseFilters::default());
        assert_eq!(visible.len(), 4);

        let mut filters = CourseFilters::default();
        filters.price_range = (0.0, 50.0);
        let visible = apply_filters(&courses, &filters);
        // Weaving (£80) and the unpriced course drop out
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_apply_filters_sort_price_low() {
        let mut filters = CourseFilters::default();
        filters.sort_by = SortBy::PriceLow;
        let visible = apply_filters(&sample_courses(), &filters);
        assert_eq!(visible[0]["title"], "Yoga");
        assert_eq!(visible[2]["title"], "Weaving");
    }

    #[test]
    fn test_apply_filters_sort_price_high() {
        let mut filters = CourseFilters::default();
        filters.sort_by = SortBy::PriceHigh;
        let visible = apply_filters(&sample_courses(), &filters);
        assert_eq!(visible[0]["title"], "Weaving");
    }

    #[test]
    fn test_apply_filters_sort_rating() {
        let mut filters = CourseFilters::default();
        filters.sort_by = SortBy::Rating;
        let visible = apply_filters(&sample_courses(), &filters);
        assert_eq!(visible[0]["title"], "Weaving");
        assert_eq!(visible[2]["title"], "Yoga");
    }

    // ─── UiState ─────────────────────────────────────────────

    #[test]
    fn test_toggle_tool_expanded() {
        let mut state = UiState::new();
        assert!(!state.expanded_tools.contains("t1"));
        state.toggle_tool_expanded("t1");
        assert!(state.expanded_tools.contains("t1"));
        state.toggle_tool_expanded("t1");
        assert!(!state.expanded_tools.contains("t1"));
    }
}
