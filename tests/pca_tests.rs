use approx::assert_abs_diff_eq;
use hs_dycore::inspect::summarize_dataset;
use hs_dycore::netcdf_io::{load_field, load_time_index, FieldSelector, PcaWriter};
use hs_dycore::pca::{
    flatten_space, prepare_pca_analysis, remove_time_mean, spatial_covariance, unflatten_space,
};
use hs_dycore::HsDycoreError;
use ndarray::{Array1, Array3, Array4};
use netcdf::{create, open};
use std::path::Path;
use tempfile::tempdir;

/// Travelling and standing waves on a small grid with a deterministic ripple
fn synthetic_field(nlon: usize, nlat: usize, ntime: usize) -> Array3<f64> {
    Array3::from_shape_fn((nlon, nlat, ntime), |(i, j, t)| {
        let x = i as f64 / nlon as f64 * std::f64::consts::TAU;
        let y = (j as f64 + 0.5) / nlat as f64 * std::f64::consts::PI;
        let tt = t as f64;
        250.0 + 10.0 * y.sin()
            + 4.0 * (x - 0.3 * tt).cos() * y.sin()
            + 1.5 * (2.0 * x).sin() * (2.0 * y).cos() * (0.45 * tt).sin()
            + 0.1 * ((i * 13 + j * 7 + t * 3) % 17) as f64
    })
}

/// Value stored at `(time, layer, lat, lon)` in the fixture file
fn fixture_value(t: usize, k: usize, j: usize, i: usize) -> f64 {
    (t * 1000 + k * 100 + j * 10 + i) as f64
}

fn write_engine_fixture(path: &Path, ntime: usize, nlayer: usize, nlat: usize, nlon: usize) {
    let mut file = create(path).expect("Failed to create NetCDF file");
    file.add_dimension("time", ntime)
        .expect("Failed to add dimension time");
    file.add_dimension("layer", nlayer)
        .expect("Failed to add dimension layer");
    file.add_dimension("lat", nlat)
        .expect("Failed to add dimension lat");
    file.add_dimension("lon", nlon)
        .expect("Failed to add dimension lon");

    {
        let time = Array1::from_shape_fn(ntime, |t| 0.25 * t as f64);
        let mut var = file
            .add_variable::<f64>("time", &["time"])
            .expect("Failed to add time");
        var.put_attribute("units", "days since 0001-01-01")
            .expect("Failed to add units");
        var.put(time.view(), ..).expect("Failed to write time");
    }
    {
        let lat = Array1::from_shape_fn(nlat, |j| -60.0 + 40.0 * j as f64);
        let mut var = file
            .add_variable::<f64>("lat", &["lat"])
            .expect("Failed to add lat");
        var.put_attribute("units", "degrees_north")
            .expect("Failed to add units");
        var.put(lat.view(), ..).expect("Failed to write lat");
    }
    {
        let lon = Array1::from_shape_fn(nlon, |i| 90.0 * i as f64);
        let mut var = file
            .add_variable::<f64>("lon", &["lon"])
            .expect("Failed to add lon");
        var.put(lon.view(), ..).expect("Failed to write lon");
    }
    {
        let data = Array4::from_shape_fn((ntime, nlayer, nlat, nlon), |(t, k, j, i)| {
            fixture_value(t, k, j, i)
        });
        let mut var = file
            .add_variable::<f64>("temp", &["time", "layer", "lat", "lon"])
            .expect("Failed to add temp");
        var.put_attribute("units", "K").expect("Failed to add units");
        var.put_attribute("long_name", "temperature")
            .expect("Failed to add long_name");
        var.put(data.view(), ..).expect("Failed to write temp");
    }
    file.add_attribute("model", "held-suarez")
        .expect("Failed to add global attribute");
}

#[test]
fn test_frac_var_sums_to_one() {
    for (nlon, nlat, ntime) in [(4, 3, 30), (6, 4, 12), (2, 2, 50)] {
        let field = synthetic_field(nlon, nlat, ntime);
        let pca = prepare_pca_analysis(field.view(), 1).expect("PCA failed");
        assert_abs_diff_eq!(pca.frac_var.sum(), 1.0, epsilon = 1e-9);
        assert!(pca.frac_var.iter().all(|v| *v >= -1e-12));
        assert!(pca
            .eigenvalues
            .windows(2)
            .into_iter()
            .all(|w| w[0] >= w[1]));
    }
}

#[test]
fn test_covariance_is_symmetric() {
    let field = synthetic_field(5, 4, 25);
    let x = flatten_space(field.view());
    let (anomalies, time_mean) = remove_time_mean(x.view()).expect("mean removal failed");
    assert_eq!(time_mean.dim(), (1, 20));

    let cov = spatial_covariance(anomalies.view()).expect("covariance failed");
    assert_eq!(cov.dim(), (20, 20));
    for i in 0..20 {
        for j in 0..20 {
            assert_abs_diff_eq!(cov[[i, j]], cov[[j, i]], epsilon = 1e-12);
        }
    }
}

#[test]
fn test_reconstruction_error_decreases_to_zero() {
    let field = synthetic_field(4, 3, 40);
    let pca = prepare_pca_analysis(field.view(), 3).expect("PCA failed");
    let errors = pca.reconstruction_errors().expect("errors failed");

    assert_eq!(errors.len(), pca.n_space());
    for pair in errors.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-9, "{:?}", errors);
    }
    let scale = pca.anomalies.mapv(|v| v * v).sum().sqrt();
    assert!(errors[errors.len() - 1] <= 1e-9 * scale);

    // Retained modes reproduce the k = 3 truncation.
    let truncated = pca.reconstruct_with(3).expect("reconstruction failed");
    let retained = pca.reconstruct();
    for (a, b) in truncated.iter().zip(retained.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
    }
}

#[test]
fn test_output_shapes() {
    let field = synthetic_field(6, 5, 18);
    let pca = prepare_pca_analysis(field.view(), 4).expect("PCA failed");
    assert_eq!(pca.eofs.dim(), (30, 4));
    assert_eq!(pca.a.dim(), (4, 18));
    assert_eq!(pca.pcs.dim(), (18, 30));
    assert_eq!(pca.time_mean.dim(), (1, 30));
    assert_eq!(pca.eof_maps().expect("maps failed").dim(), (6, 5, 4));
}

#[test]
fn test_invalid_pca_inputs() {
    let field = synthetic_field(3, 2, 10);
    assert!(matches!(
        prepare_pca_analysis(field.view(), 0),
        Err(HsDycoreError::InvalidArgument(_))
    ));
    assert!(matches!(
        prepare_pca_analysis(field.view(), 7),
        Err(HsDycoreError::InvalidArgument(_))
    ));

    let single_step = synthetic_field(3, 2, 1);
    assert!(matches!(
        prepare_pca_analysis(single_step.view(), 1),
        Err(HsDycoreError::InvalidArgument(_))
    ));

    let constant = Array3::from_elem((3, 2, 10), 288.0);
    assert!(matches!(
        prepare_pca_analysis(constant.view(), 1),
        Err(HsDycoreError::Computation(_))
    ));

    let mut with_nan = synthetic_field(3, 2, 10);
    with_nan[[1, 1, 4]] = f64::NAN;
    assert!(matches!(
        prepare_pca_analysis(with_nan.view(), 1),
        Err(HsDycoreError::Computation(_))
    ));
}

#[test]
fn test_flatten_round_trip_on_grid() {
    let field = synthetic_field(4, 3, 5);
    let x = flatten_space(field.view());
    // Point (ilon = 2, ilat = 1) lives in column 2 * 3 + 1.
    assert_eq!(x[[4, 7]], field[[2, 1, 4]]);

    let maps = unflatten_space(x.t(), 4, 3).expect("unflatten failed");
    assert_eq!(maps, field);
}

#[test]
fn test_load_field_pins_layer_and_orders_axes() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("output.nc");
    write_engine_fixture(&path, 6, 3, 2, 4);

    let file = open(&path).expect("Failed to open NetCDF file");
    let selector = FieldSelector::new("temp").with_index("layer", 2);
    let field = load_field(&file, &selector).expect("Failed to load field");

    assert_eq!(field.dim(), (4, 2, 6));
    assert_eq!(field[[3, 1, 5]], fixture_value(5, 2, 1, 3));
    assert_eq!(field[[0, 0, 0]], fixture_value(0, 2, 0, 0));

    let time = load_time_index(&file, "time").expect("Failed to load time");
    assert_eq!(time.len(), 6);
    assert_eq!(time[4], 1.0);
}

#[test]
fn test_load_field_errors() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("output.nc");
    write_engine_fixture(&path, 4, 3, 2, 2);
    let file = open(&path).expect("Failed to open NetCDF file");

    let missing = load_field(&file, &FieldSelector::new("u"));
    assert!(matches!(missing, Err(HsDycoreError::VariableNotFound { .. })));

    let unpinned = load_field(&file, &FieldSelector::new("temp"));
    assert!(matches!(unpinned, Err(HsDycoreError::InvalidArgument(_))));

    let out_of_range = load_field(&file, &FieldSelector::new("temp").with_index("layer", 3));
    assert!(matches!(out_of_range, Err(HsDycoreError::InvalidArgument(_))));

    let mut renamed = FieldSelector::new("temp").with_index("layer", 0);
    renamed.lon_dim = "longitude".to_string();
    assert!(matches!(
        load_field(&file, &renamed),
        Err(HsDycoreError::DimensionNotFound { .. })
    ));
}

#[test]
fn test_fill_values_become_nan() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("filled.nc");
    {
        let mut file = create(&path).expect("Failed to create NetCDF file");
        file.add_dimension("time", 3).expect("Failed to add time");
        file.add_dimension("lat", 1).expect("Failed to add lat");
        file.add_dimension("lon", 2).expect("Failed to add lon");
        let mut var = file
            .add_variable::<f64>("ps", &["time", "lat", "lon"])
            .expect("Failed to add ps");
        var.set_fill_value(-999.0).expect("Failed to set fill value");
        let data = Array3::from_shape_vec((3, 1, 2), vec![1.0, 2.0, -999.0, 4.0, 5.0, 6.0])
            .expect("Failed to build data");
        var.put(data.view(), ..).expect("Failed to write ps");
    }

    let file = open(&path).expect("Failed to open NetCDF file");
    let field = load_field(&file, &FieldSelector::new("ps")).expect("Failed to load field");
    assert_eq!(field.dim(), (2, 1, 3));
    assert!(field[[0, 0, 1]].is_nan());
    assert_eq!(field[[1, 0, 1]], 4.0);
}

#[test]
fn test_pca_writer_output() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let input_path = temp_dir.path().join("output.nc");
    let output_path = temp_dir.path().join("eof.nc");

    // Fixture values are linear in time, so add a wave to get several modes.
    write_engine_fixture(&input_path, 12, 2, 3, 4);
    let file = open(&input_path).expect("Failed to open NetCDF file");
    let selector = FieldSelector::new("temp").with_index("layer", 1);
    let mut field = load_field(&file, &selector).expect("Failed to load field");
    field += &synthetic_field(4, 3, 12);

    let pca = prepare_pca_analysis(field.view(), 2).expect("PCA failed");
    PcaWriter::new(&file, &output_path)
        .write(&pca, &selector)
        .expect("Failed to write EOFs");

    let out = open(&output_path).expect("Failed to open output");
    let eof = out.variable("eof").expect("eof not found");
    let dims: Vec<String> = eof.dimensions().iter().map(|d| d.name()).collect();
    assert_eq!(dims, vec!["mode", "lat", "lon"]);

    let eof_values = eof.get_values::<f64, _>(..).expect("Failed to read eof");
    let maps = pca.eof_maps().expect("maps failed");
    // (mode 1, lat 2, lon 3) in row-major (mode, lat, lon) order.
    assert_abs_diff_eq!(eof_values[12 + 2 * 4 + 3], maps[[3, 2, 1]], epsilon = 1e-12);

    let pc = out.variable("pc").expect("pc not found");
    assert_eq!(pc.len(), 2 * 12);

    let frac = out
        .variable("frac_var")
        .expect("frac_var not found")
        .get_values::<f64, _>(..)
        .expect("Failed to read frac_var");
    assert_eq!(frac.len(), 12);
    assert_abs_diff_eq!(frac.iter().sum::<f64>(), 1.0, epsilon = 1e-9);

    let lat = out
        .variable("lat")
        .expect("lat not copied")
        .get_values::<f64, _>(..)
        .expect("Failed to read lat");
    assert_eq!(lat, vec![-60.0, -20.0, 20.0]);

    assert!(out.variable("time_mean").is_some());
    assert!(out.attribute("history").is_some());
}

#[test]
fn test_inspect_summary() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("output.nc");
    write_engine_fixture(&path, 5, 2, 3, 4);

    let file = open(&path).expect("Failed to open NetCDF file");
    let summary = summarize_dataset(&file).expect("Failed to summarize");

    let dims: Vec<&str> = summary.dimensions.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(dims, vec!["lat", "layer", "lon", "time"]);

    let temp = summary.variable("temp").expect("temp not listed");
    assert_eq!(temp.dimensions, vec!["time", "layer", "lat", "lon"]);
    assert_eq!(temp.shape, vec![5, 2, 3, 4]);
    assert_eq!(temp.units.as_deref(), Some("K"));
    assert_eq!(temp.long_name.as_deref(), Some("temperature"));

    assert_eq!(
        summary.global_attributes,
        vec![("model".to_string(), "held-suarez".to_string())]
    );
}
