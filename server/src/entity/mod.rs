pub mod cliente;
pub mod obra;
pub mod producto;
pub mod registro;
pub mod user;
