mod add_resource;
mod import;
mod jobs;
mod manifest;
mod notify;
mod rebuild;
mod status;
mod work;

pub use add_resource::cmd_add_resource;
pub use import::cmd_import;
pub use jobs::cmd_jobs;
pub use manifest::cmd_manifest;
pub use notify::{cmd_data_loaded, cmd_notify};
pub use rebuild::cmd_rebuild;
pub use status::cmd_status;
pub use work::cmd_work;
