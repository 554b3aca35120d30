use std::path::PathBuf;

use clap::Parser;

/// Parses and resolves a Verona module, then prints the resolved tree.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The module to compile: a `.verona` file or a directory of them.
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::Parser as _;

    use super::Cli;

    #[test]
    fn single_path() {
        let cli = Cli::try_parse_from(["veronac", "foo.verona"]).unwrap();
        assert_eq!(cli.path, Path::new("foo.verona"));
    }

    #[test]
    fn path_is_required() {
        let err = Cli::try_parse_from(["veronac"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn only_one_path() {
        let err = Cli::try_parse_from(["veronac", "a.verona", "b.verona"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn help_is_not_an_error() {
        let err = Cli::try_parse_from(["veronac", "--help"]).unwrap_err();
        assert_eq!(err.exit_code(), 0);
    }
}
