//! Tests for the wirings module

use ncps_experiments::wirings::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fully_connected_creation() {
        let fc = FullyConnected::new(10, None, 1234, true);
        assert_eq!(fc.units(), 10);
        assert_eq!(fc.output_dim(), 10);
        assert!(!fc.is_built());
    }

    #[test]
    fn test_fully_connected_build() {
        let mut fc = FullyConnected::new(10, Some(5), 1234, true);
        fc.build(20).unwrap();
        assert!(fc.is_built());
        assert_eq!(fc.input_dim(), Some(20));
        assert_eq!(fc.output_dim(), 5);

        let sensory = fc.sensory_adjacency_matrix().unwrap();
        assert_eq!(sensory.shape(), &[20, 10]);
        assert_eq!(fc.sensory_synapse_count(), 200);
        assert_eq!(fc.synapse_count(), 100);
    }

    #[test]
    fn test_conflicting_input_dim() {
        let mut fc = FullyConnected::new(10, None, 1234, true);
        fc.build(20).unwrap();
        assert_eq!(
            fc.build(30),
            Err(WiringError::ConflictingInputDim {
                existing: 20,
                requested: 30
            })
        );
    }

    #[test]
    fn test_ncp_structure() {
        let ncp = NCP::new(
            10,    // inter_neurons
            8,     // command_neurons
            5,     // motor_neurons
            6,     // sensory_fanout
            6,     // inter_fanout
            4,     // recurrent_command_synapses
            6,     // motor_fanin
            22222, // seed
        )
        .unwrap();

        assert_eq!(ncp.units(), 23);
        assert_eq!(ncp.output_dim(), 5);
        assert_eq!(ncp.num_layers(), 3);
        assert_eq!(ncp.neurons_of_layer(0).len(), 10);
        assert_eq!(ncp.neurons_of_layer(1).len(), 8);
        assert_eq!(ncp.neurons_of_layer(2).len(), 5);
    }

    #[test]
    fn test_ncp_neuron_types() {
        let ncp = NCP::new(10, 8, 5, 6, 6, 4, 6, 22222).unwrap();

        // motor neurons come first, then command, then inter
        assert_eq!(ncp.neuron_type(0), NeuronType::Motor);
        assert_eq!(ncp.neuron_type(4), NeuronType::Motor);
        assert_eq!(ncp.neuron_type(5), NeuronType::Command);
        assert_eq!(ncp.neuron_type(12), NeuronType::Command);
        assert_eq!(ncp.neuron_type(13), NeuronType::Inter);
    }

    #[test]
    fn test_ncp_build() {
        let mut ncp = NCP::new(10, 8, 5, 6, 6, 4, 6, 22222).unwrap();
        ncp.build(15).unwrap();

        assert!(ncp.is_built());
        assert_eq!(ncp.input_dim(), Some(15));

        // sensory synapses only reach inter neurons
        let sensory = ncp.sensory_adjacency_matrix().unwrap();
        let inter = ncp.neurons_of_layer(0);
        for ((_, dest), &polarity) in sensory.indexed_iter() {
            if polarity != 0 {
                assert!(inter.contains(&dest));
            }
        }
        assert!(ncp.sensory_synapse_count() >= 15);
    }

    #[test]
    fn test_ncp_invalid_fanout() {
        assert!(matches!(
            NCP::new(4, 8, 5, 6, 6, 4, 6, 22222),
            Err(WiringError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_auto_ncp_convenience() {
        let auto_ncp = AutoNCP::new(32, 8, 0.5, 22222).unwrap();

        assert_eq!(auto_ncp.units(), 32);
        assert_eq!(auto_ncp.output_dim(), 8);
        assert_eq!(auto_ncp.num_layers(), 3);
    }

    #[test]
    fn test_auto_ncp_invalid_sparsity() {
        assert!(AutoNCP::new(32, 8, 1.5, 22222).is_err());
    }

    #[test]
    fn test_auto_ncp_invalid_output_size() {
        assert!(AutoNCP::new(10, 9, 0.5, 22222).is_err());
    }

    #[test]
    fn test_auto_ncp_is_seeded() {
        let mut a = AutoNCP::new(16, 1, 0.5, 22222).unwrap();
        let mut b = AutoNCP::new(16, 1, 0.5, 22222).unwrap();
        a.build(2).unwrap();
        b.build(2).unwrap();

        assert_eq!(a.adjacency_matrix(), b.adjacency_matrix());
        assert_eq!(a.sensory_adjacency_matrix(), b.sensory_adjacency_matrix());
    }

    #[test]
    fn test_add_synapse() {
        let mut fc = FullyConnected::new(10, None, 1234, true);

        fc.add_synapse(0, 1, 1).unwrap();
        assert_eq!(fc.adjacency_matrix()[[0, 1]], 1);

        fc.add_synapse(2, 3, -1).unwrap();
        assert_eq!(fc.adjacency_matrix()[[2, 3]], -1);
    }

    #[test]
    fn test_add_synapse_invalid_polarity() {
        let mut fc = FullyConnected::new(10, None, 1234, true);
        assert_eq!(fc.add_synapse(0, 1, 2), Err(WiringError::InvalidPolarity(2)));
    }

    #[test]
    fn test_add_synapse_out_of_bounds() {
        let mut fc = FullyConnected::new(10, None, 1234, true);
        assert!(matches!(
            fc.add_synapse(0, 15, 1),
            Err(WiringError::SynapseOutOfRange { dest: 15, .. })
        ));
    }
}
