pub mod af_distribution;
pub mod tumor_mutational_burden;
