use ndarray::Array2;
use rand::prelude::*;

use super::{check_polarity, WiringError};

/// Role of a neuron inside a wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeuronType {
    Motor,
    Command,
    Inter,
}

/// Connectivity shared by every wiring.
pub trait Wiring: Send + Sync {
    /// Total number of neurons (the recurrent state size).
    fn units(&self) -> usize;

    /// Number of input features, known once the wiring is built.
    fn input_dim(&self) -> Option<usize>;

    /// Number of motor neurons read out as the cell output.
    fn output_dim(&self) -> usize;

    fn num_layers(&self) -> usize {
        1
    }

    /// Neuron ids of one layer, in state order.
    fn neurons_of_layer(&self, layer: usize) -> Vec<usize> {
        if layer == 0 {
            (0..self.units()).collect()
        } else {
            Vec::new()
        }
    }

    fn neuron_type(&self, neuron: usize) -> NeuronType {
        if neuron < self.output_dim() {
            NeuronType::Motor
        } else {
            NeuronType::Inter
        }
    }

    fn is_built(&self) -> bool {
        self.input_dim().is_some()
    }

    /// Fixes the input dimension and creates the sensory synapses.
    ///
    /// Building twice with the same dimension is a no-op.
    fn build(&mut self, input_dim: usize) -> Result<(), WiringError>;

    fn adjacency_matrix(&self) -> &Array2<i32>;

    fn sensory_adjacency_matrix(&self) -> Option<&Array2<i32>>;

    fn add_synapse(&mut self, src: usize, dest: usize, polarity: i32) -> Result<(), WiringError>;

    fn add_sensory_synapse(
        &mut self,
        src: usize,
        dest: usize,
        polarity: i32,
    ) -> Result<(), WiringError>;

    fn synapse_count(&self) -> usize {
        self.adjacency_matrix().iter().filter(|&&p| p != 0).count()
    }

    fn sensory_synapse_count(&self) -> usize {
        self.sensory_adjacency_matrix()
            .map(|m| m.iter().filter(|&&p| p != 0).count())
            .unwrap_or(0)
    }
}

/// Every neuron connected to every other neuron (optionally to itself).
///
/// Polarities are drawn from a seeded generator, roughly one third inhibitory.
#[derive(Clone, Debug)]
pub struct FullyConnected {
    units: usize,
    output_dim: usize,
    adjacency_matrix: Array2<i32>,
    sensory_adjacency_matrix: Option<Array2<i32>>,
    input_dim: Option<usize>,
    rng: StdRng,
}

impl FullyConnected {
    pub fn new(units: usize, output_dim: Option<usize>, seed: u64, self_connections: bool) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut adjacency_matrix = Array2::zeros((units, units));
        for ((src, dest), polarity) in adjacency_matrix.indexed_iter_mut() {
            if src == dest && !self_connections {
                continue;
            }
            *polarity = random_polarity(&mut rng);
        }

        Self {
            units,
            output_dim: output_dim.unwrap_or(units),
            adjacency_matrix,
            sensory_adjacency_matrix: None,
            input_dim: None,
            rng,
        }
    }
}

fn random_polarity(rng: &mut StdRng) -> i32 {
    if rng.gen::<f64>() < 0.33 {
        -1
    } else {
        1
    }
}

impl Wiring for FullyConnected {
    fn units(&self) -> usize {
        self.units
    }

    fn input_dim(&self) -> Option<usize> {
        self.input_dim
    }

    fn output_dim(&self) -> usize {
        self.output_dim
    }

    fn build(&mut self, input_dim: usize) -> Result<(), WiringError> {
        if let Some(existing) = self.input_dim {
            return if existing == input_dim {
                Ok(())
            } else {
                Err(WiringError::ConflictingInputDim {
                    existing,
                    requested: input_dim,
                })
            };
        }

        let mut sensory = Array2::zeros((input_dim, self.units));
        for polarity in sensory.iter_mut() {
            *polarity = random_polarity(&mut self.rng);
        }
        self.input_dim = Some(input_dim);
        self.sensory_adjacency_matrix = Some(sensory);
        Ok(())
    }

    fn adjacency_matrix(&self) -> &Array2<i32> {
        &self.adjacency_matrix
    }

    fn sensory_adjacency_matrix(&self) -> Option<&Array2<i32>> {
        self.sensory_adjacency_matrix.as_ref()
    }

    fn add_synapse(&mut self, src: usize, dest: usize, polarity: i32) -> Result<(), WiringError> {
        check_polarity(polarity)?;
        if src >= self.units || dest >= self.units {
            return Err(WiringError::SynapseOutOfRange {
                src,
                dest,
                sources: self.units,
                units: self.units,
            });
        }
        self.adjacency_matrix[[src, dest]] = polarity;
        Ok(())
    }

    fn add_sensory_synapse(
        &mut self,
        src: usize,
        dest: usize,
        polarity: i32,
    ) -> Result<(), WiringError> {
        check_polarity(polarity)?;
        let units = self.units;
        let sensory = self
            .sensory_adjacency_matrix
            .as_mut()
            .ok_or(WiringError::NotBuilt)?;
        let sources = sensory.nrows();
        if src >= sources || dest >= units {
            return Err(WiringError::SynapseOutOfRange {
                src,
                dest,
                sources,
                units,
            });
        }
        sensory[[src, dest]] = polarity;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_gives_same_matrix() {
        let a = FullyConnected::new(6, None, 7, true);
        let b = FullyConnected::new(6, None, 7, true);
        assert_eq!(a.adjacency_matrix(), b.adjacency_matrix());
    }

    #[test]
    fn no_self_connections_leaves_diagonal_empty() {
        let fc = FullyConnected::new(6, None, 7, false);
        for i in 0..6 {
            assert_eq!(fc.adjacency_matrix()[[i, i]], 0);
        }
        assert_eq!(fc.synapse_count(), 30);
    }

    #[test]
    fn rebuild_with_same_dim_is_noop() {
        let mut fc = FullyConnected::new(4, None, 1, true);
        fc.build(3).unwrap();
        let before = fc.sensory_adjacency_matrix().unwrap().clone();
        fc.build(3).unwrap();
        assert_eq!(fc.sensory_adjacency_matrix().unwrap(), &before);
    }
}
