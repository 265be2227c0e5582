pub mod init;
pub mod show;
pub mod upload;

pub use init::{init, InitArgs};
pub use show::{show, ShowArgs};
pub use upload::{upload, UploadArgs};
