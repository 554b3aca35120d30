pub mod keyvec;
pub mod peek;

/// Inline snapshot assertion that records the source under test as the
/// snapshot's info, so failing snapshots show what was being compiled.
///
/// The calling crate must depend on `insta` with the `yaml` feature.
#[macro_export]
macro_rules! assert_snapshot_with_source {
    ($source:expr => $output:expr, @$snapshot:literal) => {{
        insta::with_settings!({
            info => &$source,
            omit_expression => true,
        }, {
            insta::assert_snapshot!($output, @$snapshot);
        })
    }};
}
