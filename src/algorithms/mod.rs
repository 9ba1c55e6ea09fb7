pub mod hadamard;
pub mod max_weight_clique;
