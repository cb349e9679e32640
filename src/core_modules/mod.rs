pub mod channel;
pub mod channel_pca;
pub mod eigen;
pub mod matrix;
pub mod plane_solver;
pub mod utils;
