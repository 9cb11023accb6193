pub mod landmark;

pub use landmark::{
    FrameSize, Landmark, LandmarkCountError, LandmarkFrame, LandmarkIndex, PixelPoint,
};
