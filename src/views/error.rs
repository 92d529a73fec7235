//! Pages for error responses.
//!
//! These are built without touching the database, so they can still render
//! when the database is the thing that failed.

use serde::Serialize;

use crate::impl_template_responder;
use crate::views::PageInfo;

/// A page in response to a bad request.
#[derive(Debug, Serialize)]
pub struct BadRequestPage {
    pub message: String,
    pub page_info: PageInfo,
}

impl BadRequestPage {
    pub fn new<S>(message: S) -> BadRequestPage
    where
        S: Into<String>,
    {
        BadRequestPage {
            message: message.into(),
            page_info: PageInfo::bare(),
        }
    }
}

impl_template_responder!(BadRequestPage, "pages/error/400");

/// A page for a resource that wasn't found.
#[derive(Debug, Serialize)]
pub struct NotFoundPage {
    pub message: String,
    pub page_info: PageInfo,
}

impl NotFoundPage {
    pub fn new<S>(message: S) -> NotFoundPage
    where
        S: Into<String>,
    {
        NotFoundPage {
            message: message.into(),
            page_info: PageInfo::bare(),
        }
    }
}

impl_template_responder!(NotFoundPage, "pages/error/404");

/// A page in response to an internal server error.
#[derive(Debug, Serialize)]
pub struct InternalServerErrorPage {
    pub message: String,
    pub page_info: PageInfo,
}

impl InternalServerErrorPage {
    pub fn new<S>(message: S) -> InternalServerErrorPage
    where
        S: Into<String>,
    {
        InternalServerErrorPage {
            message: message.into(),
            page_info: PageInfo::bare(),
        }
    }
}

impl_template_responder!(InternalServerErrorPage, "pages/error/500");
