pub mod calibration;
pub mod consts;
pub mod error;
pub mod filing;
pub mod frame;
pub mod io;
pub mod master;
pub mod pipeline;
