use ndarray::Array2;
use rand::prelude::*;

use super::base::{NeuronType, Wiring};
use super::{check_polarity, WiringError};

/// Neural Circuit Policy wiring.
///
/// Four layers, `sensory -> inter -> command -> motor`, with recurrent
/// synapses among command neurons. Neuron ids are laid out as
/// `[motor..., command..., inter...]`, so the first `output_dim` state entries
/// are the motor neurons.
#[derive(Clone, Debug)]
pub struct NCP {
    adjacency_matrix: Array2<i32>,
    sensory_adjacency_matrix: Option<Array2<i32>>,
    input_dim: Option<usize>,
    motor: Vec<usize>,
    command: Vec<usize>,
    inter: Vec<usize>,
    sensory_fanout: usize,
    inter_fanout: usize,
    recurrent_command_synapses: usize,
    motor_fanin: usize,
    rng: StdRng,
}

impl NCP {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        inter_neurons: usize,
        command_neurons: usize,
        motor_neurons: usize,
        sensory_fanout: usize,
        inter_fanout: usize,
        recurrent_command_synapses: usize,
        motor_fanin: usize,
        seed: u64,
    ) -> Result<Self, WiringError> {
        if motor_fanin > command_neurons {
            return Err(WiringError::InvalidParameters(format!(
                "motor fanin {motor_fanin} exceeds the {command_neurons} command neurons"
            )));
        }
        if sensory_fanout > inter_neurons {
            return Err(WiringError::InvalidParameters(format!(
                "sensory fanout {sensory_fanout} exceeds the {inter_neurons} inter neurons"
            )));
        }
        if inter_fanout > command_neurons {
            return Err(WiringError::InvalidParameters(format!(
                "inter fanout {inter_fanout} exceeds the {command_neurons} command neurons"
            )));
        }

        let units = inter_neurons + command_neurons + motor_neurons;
        let command_start = motor_neurons;
        let inter_start = motor_neurons + command_neurons;

        Ok(Self {
            adjacency_matrix: Array2::zeros((units, units)),
            sensory_adjacency_matrix: None,
            input_dim: None,
            motor: (0..command_start).collect(),
            command: (command_start..inter_start).collect(),
            inter: (inter_start..units).collect(),
            sensory_fanout,
            inter_fanout,
            recurrent_command_synapses,
            motor_fanin,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    fn polarity(&mut self) -> i32 {
        if self.rng.gen_bool(0.5) {
            1
        } else {
            -1
        }
    }

    fn sample(&mut self, pool: &[usize], amount: usize) -> Vec<usize> {
        pool.choose_multiple(&mut self.rng, amount).copied().collect()
    }

    fn connect_sensory_to_inter(&mut self, input_dim: usize) -> Result<(), WiringError> {
        let inter = self.inter.clone();
        let sensory: Vec<usize> = (0..input_dim).collect();
        let mut unreached = inter.clone();

        for &src in &sensory {
            for dest in self.sample(&inter, self.sensory_fanout) {
                unreached.retain(|&n| n != dest);
                let polarity = self.polarity();
                self.add_sensory_synapse(src, dest, polarity)?;
            }
        }

        let mean_fanin =
            (input_dim * self.sensory_fanout / inter.len().max(1)).clamp(1, input_dim.max(1));
        for dest in unreached {
            for src in self.sample(&sensory, mean_fanin) {
                let polarity = self.polarity();
                self.add_sensory_synapse(src, dest, polarity)?;
            }
        }
        Ok(())
    }

    fn connect_inter_to_command(&mut self) -> Result<(), WiringError> {
        let inter = self.inter.clone();
        let command = self.command.clone();
        let mut unreached = command.clone();

        for &src in &inter {
            for dest in self.sample(&command, self.inter_fanout) {
                unreached.retain(|&n| n != dest);
                let polarity = self.polarity();
                self.add_synapse(src, dest, polarity)?;
            }
        }

        let mean_fanin =
            (inter.len() * self.inter_fanout / command.len().max(1)).clamp(1, inter.len().max(1));
        for dest in unreached {
            for src in self.sample(&inter, mean_fanin) {
                let polarity = self.polarity();
                self.add_synapse(src, dest, polarity)?;
            }
        }
        Ok(())
    }

    fn connect_command_recurrent(&mut self) -> Result<(), WiringError> {
        let command = self.command.clone();
        if command.is_empty() {
            return Ok(());
        }
        for _ in 0..self.recurrent_command_synapses {
            let src = command[self.rng.gen_range(0..command.len())];
            let dest = command[self.rng.gen_range(0..command.len())];
            let polarity = self.polarity();
            self.add_synapse(src, dest, polarity)?;
        }
        Ok(())
    }

    fn connect_command_to_motor(&mut self) -> Result<(), WiringError> {
        let command = self.command.clone();
        let motor = self.motor.clone();
        let mut unreached = command.clone();

        for &dest in &motor {
            for src in self.sample(&command, self.motor_fanin) {
                unreached.retain(|&n| n != src);
                let polarity = self.polarity();
                self.add_synapse(src, dest, polarity)?;
            }
        }

        let mean_fanout =
            (motor.len() * self.motor_fanin / command.len().max(1)).clamp(1, motor.len().max(1));
        for src in unreached {
            for dest in self.sample(&motor, mean_fanout) {
                let polarity = self.polarity();
                self.add_synapse(src, dest, polarity)?;
            }
        }
        Ok(())
    }
}

impl Wiring for NCP {
    fn units(&self) -> usize {
        self.adjacency_matrix.nrows()
    }

    fn input_dim(&self) -> Option<usize> {
        self.input_dim
    }

    fn output_dim(&self) -> usize {
        self.motor.len()
    }

    fn num_layers(&self) -> usize {
        3
    }

    fn neurons_of_layer(&self, layer: usize) -> Vec<usize> {
        match layer {
            0 => self.inter.clone(),
            1 => self.command.clone(),
            2 => self.motor.clone(),
            _ => Vec::new(),
        }
    }

    fn neuron_type(&self, neuron: usize) -> NeuronType {
        if neuron < self.motor.len() {
            NeuronType::Motor
        } else if neuron < self.motor.len() + self.command.len() {
            NeuronType::Command
        } else {
            NeuronType::Inter
        }
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

        self.input_dim = Some(input_dim);
        self.sensory_adjacency_matrix = Some(Array2::zeros((input_dim, self.units())));

        self.connect_sensory_to_inter(input_dim)?;
        self.connect_inter_to_command()?;
        self.connect_command_recurrent()?;
        self.connect_command_to_motor()
    }

    fn adjacency_matrix(&self) -> &Array2<i32> {
        &self.adjacency_matrix
    }

    fn sensory_adjacency_matrix(&self) -> Option<&Array2<i32>> {
        self.sensory_adjacency_matrix.as_ref()
    }

    fn add_synapse(&mut self, src: usize, dest: usize, polarity: i32) -> Result<(), WiringError> {
        check_polarity(polarity)?;
        let units = self.units();
        if src >= units || dest >= units {
            return Err(WiringError::SynapseOutOfRange {
                src,
                dest,
                sources: units,
                units,
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
        let units = self.units();
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

/// NCP wiring derived from a unit count, a motor count and a sparsity level.
///
/// 40% of the non-motor neurons become command neurons, the rest inter
/// neurons; fan-outs scale with `1 - sparsity_level`.
#[derive(Clone, Debug)]
pub struct AutoNCP {
    ncp: NCP,
}

impl AutoNCP {
    pub fn new(
        units: usize,
        output_size: usize,
        sparsity_level: f64,
        seed: u64,
    ) -> Result<Self, WiringError> {
        if output_size + 2 >= units {
            return Err(WiringError::InvalidParameters(format!(
                "output size {output_size} must be less than units - 2 ({})",
                units.saturating_sub(2)
            )));
        }
        if !(0.0..=0.9).contains(&sparsity_level) {
            return Err(WiringError::InvalidParameters(format!(
                "sparsity level must be within [0.0, 0.9], got {sparsity_level}"
            )));
        }

        let density = 1.0 - sparsity_level;
        let inter_and_command = units - output_size;
        let command = ((inter_and_command as f64 * 0.4).ceil() as usize).max(1);
        let inter = inter_and_command - command;

        let scaled = |n: usize, factor: f64| ((n as f64 * factor).ceil() as usize).max(1);
        let ncp = NCP::new(
            inter,
            command,
            output_size,
            scaled(inter, density),
            scaled(command, density),
            scaled(command, density * 2.0),
            scaled(command, density),
            seed,
        )?;
        Ok(Self { ncp })
    }
}

impl Wiring for AutoNCP {
    fn units(&self) -> usize {
        self.ncp.units()
    }

    fn input_dim(&self) -> Option<usize> {
        self.ncp.input_dim()
    }

    fn output_dim(&self) -> usize {
        self.ncp.output_dim()
    }

    fn num_layers(&self) -> usize {
        self.ncp.num_layers()
    }

    fn neurons_of_layer(&self, layer: usize) -> Vec<usize> {
        self.ncp.neurons_of_layer(layer)
    }

    fn neuron_type(&self, neuron: usize) -> NeuronType {
        self.ncp.neuron_type(neuron)
    }

    fn build(&mut self, input_dim: usize) -> Result<(), WiringError> {
        self.ncp.build(input_dim)
    }

    fn adjacency_matrix(&self) -> &Array2<i32> {
        self.ncp.adjacency_matrix()
    }

    fn sensory_adjacency_matrix(&self) -> Option<&Array2<i32>> {
        self.ncp.sensory_adjacency_matrix()
    }

    fn add_synapse(&mut self, src: usize, dest: usize, polarity: i32) -> Result<(), WiringError> {
        self.ncp.add_synapse(src, dest, polarity)
    }

    fn add_sensory_synapse(
        &mut self,
        src: usize,
        dest: usize,
        polarity: i32,
    ) -> Result<(), WiringError> {
        self.ncp.add_sensory_synapse(src, dest, polarity)
    }
}
