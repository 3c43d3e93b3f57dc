//! File storage feature.
//!
//! File bytes live in the object store under the file's id; the matching
//! metadata record lives in the document store.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/v1/files` | List all files |
//! | POST | `/api/v1/files/upload` | Upload a file (multipart `file` part) |
//! | GET | `/api/v1/files/download/{file_id}` | Download a file's content |
//! | PUT | `/api/v1/files/{file_id}?name=` | Rename a file |
//! | DELETE | `/api/v1/files/{file_id}` | Delete a file |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use routes::routes;
pub use services::{FileService, UploadPolicy};
