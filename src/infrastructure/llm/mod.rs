mod completion;

pub use completion::RigLlm;
