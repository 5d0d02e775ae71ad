pub mod auth;
pub mod credentials;
pub mod landing;
pub mod responses;
pub mod router;
pub mod session;
pub mod state;
pub mod templates;
pub mod upload_ui;
pub mod uploads;

pub use responses::{ApiMessage, json_error};
pub use state::AppState;
pub use templates::{ToolPageLayout, escape_html, render_footer, render_login_page, render_tool_page};
pub use upload_ui::{
    UPLOAD_WIDGET_SCRIPT, UPLOAD_WIDGET_STYLES, UploadWidgetConfig, render_upload_widget,
};
pub use uploads::{FileFieldConfig, read_upload_form};
