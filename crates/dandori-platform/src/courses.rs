//! Course catalogue endpoints — plain request/response wrappers.

use gloo_net::http::Request;
use serde::Deserialize;
use serde_json::Value;

use dandori_types::Result;

use crate::http::{self, DandoriApi};

/// Response envelope used by the list and search endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct CourseList {
    #[serde(default, alias = "results")]
    pub courses: Vec<Value>,
}

impl DandoriApi {
    pub async fn courses(&self) -> Result<CourseList> {
        http::send_json(Request::get(&self.url("/api/courses"))).await
    }

    pub async fn course_by_id(&self, id: &str) -> Result<Value> {
        http::send_json(Request::get(&self.url(&format!("/api/courses/{}", id)))).await
    }

    pub async fn search(&self, query: &str) -> Result<CourseList> {
        http::send_json(Request::get(&self.url("/api/search")).query([("q", query)])).await
    }

    pub async fn saved_courses(&self) -> Result<CourseList> {
        http::send_json(Request::get(&self.url("/api/user/saved-courses"))).await
    }

    pub async fn save_course(&self, course_id: &str) -> Result<Value> {
        http::send_json_body(
            Request::post(&self.url("/api/user/saved-courses")),
            &serde_json::json!({ "course_id": course_id }),
        )
        .await
    }

    pub async fn unsave_course(&self, course_id: &str) -> Result<Value> {
        http::send_json(Request::delete(
            &self.url(&format!("/api/user/saved-courses/{}", course_id)),
        ))
        .await
    }
}
