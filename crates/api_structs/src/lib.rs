mod admission;
mod booking;
mod event;
mod status;
mod subscription;
mod ticket;

pub mod dtos {
    pub use crate::admission::dtos::*;
    pub use crate::booking::dtos::*;
    pub use crate::event::dtos::*;
    pub use crate::subscription::dtos::*;
    pub use crate::ticket::dtos::*;
}

pub use crate::admission::api::*;
pub use crate::booking::api::*;
pub use crate::event::api::*;
pub use crate::status::api::*;
pub use crate::subscription::api::*;
pub use crate::ticket::api::*;
