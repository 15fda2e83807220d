#[cfg(test)]
mod tests {
    use burn::backend::NdArray;
    use burn::tensor::{Distribution, Tensor};
    use ncps_experiments::cells::{CfCCell, CfcMode};
    use ndarray::Array2;

    type Backend = NdArray<f32>;

    fn create_test_cell(mode: CfcMode) -> CfCCell<Backend> {
        let device = Default::default();
        CfCCell::new(20, 50, &device).with_mode(mode)
    }

    #[test]
    fn test_cfc_cell_creation() {
        let device = Default::default();
        let cell = CfCCell::<Backend>::new(20, 50, &device);

        assert_eq!(cell.input_size(), 20);
        assert_eq!(cell.hidden_size(), 50);
        assert_eq!(cell.mode(), CfcMode::Default);
        assert!(!cell.has_sparsity_mask());
    }

    #[test]
    fn test_cfc_forward_every_mode() {
        let device = Default::default();

        for mode in [CfcMode::Default, CfcMode::Pure, CfcMode::NoGate] {
            let cell = create_test_cell(mode);
            let input = Tensor::<Backend, 2>::random(
                [4, 20],
                Distribution::Uniform(-0.5, 0.5),
                &device,
            );
            let hx = Tensor::<Backend, 2>::zeros([4, 50], &device);

            let (output, new_hidden) = cell.forward(input, hx, 1.0);
            assert_eq!(output.dims(), [4, 50]);
            assert_eq!(new_hidden.dims(), [4, 50]);
            assert_eq!(cell.mode(), mode);
        }
    }

    #[test]
    fn test_cfc_state_change() {
        let device = Default::default();
        let cell = create_test_cell(CfcMode::Default);

        let input = Tensor::<Backend, 2>::ones([2, 20], &device);
        let hx = Tensor::<Backend, 2>::zeros([2, 50], &device);

        let (output, new_hidden) = cell.forward(input, hx.clone(), 1.0);

        let diff = (new_hidden.clone() - hx).abs().mean().into_scalar();
        assert!(diff > 0.0);

        // the output is the new hidden state
        let output_diff = (output - new_hidden).abs().mean().into_scalar();
        assert!(output_diff < 1e-6);
    }

    #[test]
    fn test_cfc_different_modes_produce_different_results() {
        let device = Default::default();

        let cell_default = create_test_cell(CfcMode::Default);
        let cell_no_gate = create_test_cell(CfcMode::NoGate);

        let input = Tensor::<Backend, 2>::random(
            [2, 20],
            Distribution::Uniform(-1.0, 1.0),
            &device,
        );
        let hx = Tensor::<Backend, 2>::zeros([2, 50], &device);

        let (out1, _) = cell_default.forward(input.clone(), hx.clone(), 1.0);
        let (out2, _) = cell_no_gate.forward(input, hx, 1.0);

        let diff = (out1 - out2).abs().mean().into_scalar();
        assert!(diff > 1e-4, "different modes should produce different outputs");
    }

    #[test]
    fn test_cfc_batch_processing() {
        let device = Default::default();
        let cell = create_test_cell(CfcMode::Default);

        for batch in [1, 8, 32] {
            let input = Tensor::<Backend, 2>::zeros([batch, 20], &device);
            let hx = Tensor::<Backend, 2>::zeros([batch, 50], &device);

            let (output, _) = cell.forward(input, hx, 1.0);
            assert_eq!(output.dims(), [batch, 50]);
        }
    }

    #[test]
    fn test_cfc_full_mask_matches_unmasked() {
        let device = Default::default();
        let cell = CfCCell::<Backend>::new(20, 50, &device);
        let masked = cell.clone().with_sparsity_mask(&Array2::ones((70, 50)), &device);
        assert!(masked.has_sparsity_mask());

        let input = Tensor::<Backend, 2>::random(
            [2, 20],
            Distribution::Uniform(-1.0, 1.0),
            &device,
        );
        let hx = Tensor::<Backend, 2>::zeros([2, 50], &device);

        let (plain, _) = cell.forward(input.clone(), hx.clone(), 1.0);
        let (with_mask, _) = masked.forward(input, hx, 1.0);
        let diff = (plain - with_mask).abs().max().into_scalar();
        assert!(diff < 1e-6);
    }
}
