// src/programs.rs

use crate::constants::{DEFAULT_SEARCH_PATH, EXEC_OVERRIDE_KEYS};
use crate::core::options::OptionSpec;
use crate::models::CheckType;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("'{0}' is not a valid program name (letters, digits, '_' and '-', starting with a letter)")]
    InvalidName(String),
    #[error("program '{0}' is already registered")]
    DuplicateProgram(String),
}

/// The declarative description of one external program: where its binary
/// lives and how configuration keys map onto its command line.
///
/// Entries are ordered; rendering walks named options in declaration order,
/// then positionals, then the variadic entry. Registering an entry binds its
/// key into the [`OptionSpec`].
#[derive(Debug, Clone)]
pub struct ProgramSpec {
    name: String,
    binary: String,
    subdir: String,
    search_path: String,
    options: Vec<(String, OptionSpec)>,
    vararg: Option<(String, OptionSpec)>,
    requires_one_of: Vec<String>,
    windows_run_prefix: Option<String>,
    windows_suffix: Option<String>,
}

impl ProgramSpec {
    pub fn new(name: &str, binary: &str) -> Self {
        Self {
            name: name.to_string(),
            binary: binary.to_string(),
            subdir: String::new(),
            search_path: DEFAULT_SEARCH_PATH.to_string(),
            options: Vec::new(),
            vararg: None,
            requires_one_of: Vec::new(),
            windows_run_prefix: None,
            windows_suffix: None,
        }
    }

    /// Default install subdirectory tried below the search path.
    pub fn in_subdir(mut self, subdir: &str) -> Self {
        self.subdir = subdir.to_string();
        self
    }

    /// Default search path for the binary (overridable per invocation).
    pub fn with_search_path(mut self, path: &str) -> Self {
        self.search_path = path.to_string();
        self
    }

    /// Declares one configuration key and how it renders.
    pub fn arg(mut self, key: &str, spec: OptionSpec) -> Self {
        self.options.push((key.to_string(), spec.bind(key)));
        self
    }

    /// Declares the variadic positional entry: a list value whose elements
    /// render individually, after every other parameter.
    pub fn vararg(mut self, key: &str, spec: OptionSpec) -> Self {
        self.vararg = Some((key.to_string(), spec.bind(key)));
        self
    }

    /// Requires at least one of the given keys to be configured.
    pub fn require_one_of(mut self, keys: &[&str]) -> Self {
        self.requires_one_of = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    /// Interpreter prepended on Windows hosts (e.g. `perl.exe`), unless the
    /// caller overrides the run prefix.
    pub fn windows_run_prefix(mut self, prefix: &str) -> Self {
        self.windows_run_prefix = Some(prefix.to_string());
        self
    }

    /// Executable suffix used on Windows hosts instead of the platform
    /// default (scripts keep their own extension).
    pub fn windows_suffix(mut self, suffix: &str) -> Self {
        self.windows_suffix = Some(suffix.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn subdir(&self) -> &str {
        &self.subdir
    }

    pub fn search_path(&self) -> &str {
        &self.search_path
    }

    pub fn options(&self) -> &[(String, OptionSpec)] {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&OptionSpec> {
        self.options
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, spec)| spec)
    }

    pub fn vararg_entry(&self) -> Option<(&str, &OptionSpec)> {
        self.vararg.as_ref().map(|(k, spec)| (k.as_str(), spec))
    }

    pub fn required_one_of(&self) -> &[String] {
        &self.requires_one_of
    }

    pub fn default_windows_run_prefix(&self) -> Option<&str> {
        self.windows_run_prefix.as_deref()
    }

    pub fn default_windows_suffix(&self) -> Option<&str> {
        self.windows_suffix.as_deref()
    }

    /// Every configuration key this program accepts with its declared type:
    /// the parameter table plus the executable-override keys shared by all
    /// programs. The variadic entry is excluded; a parameter file has no
    /// way to express a variable-length positional list.
    pub fn accepted_keys(&self) -> Vec<(String, CheckType)> {
        let mut keys: Vec<(String, CheckType)> = self
            .options
            .iter()
            .map(|(key, spec)| (key.clone(), spec.check_type()))
            .collect();
        keys.extend(
            EXEC_OVERRIDE_KEYS
                .iter()
                .map(|key| (key.to_string(), CheckType::Untyped)),
        );
        keys
    }
}

lazy_static! {
    static ref PROGRAM_NAME_RE: Regex =
        Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("program name pattern is valid");
}

/// Name-indexed collection of [`ProgramSpec`]s. The built-in table covers
/// the full factoring suite; custom registries can be assembled for tests
/// or extensions.
#[derive(Debug, Default)]
pub struct ProgramRegistry {
    programs: BTreeMap<String, ProgramSpec>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// `InvalidName` or `DuplicateProgram` when a table is malformed.
    pub fn register(&mut self, spec: ProgramSpec) -> Result<(), RegistryError> {
        if !PROGRAM_NAME_RE.is_match(&spec.name) {
            return Err(RegistryError::InvalidName(spec.name.clone()));
        }
        if self.programs.contains_key(&spec.name) {
            return Err(RegistryError::DuplicateProgram(spec.name.clone()));
        }
        self.programs.insert(spec.name.clone(), spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ProgramSpec> {
        self.programs.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.programs.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProgramSpec> {
        self.programs.values()
    }

    fn add(&mut self, spec: ProgramSpec) {
        self.register(spec).expect("built-in program table is valid");
    }

    /// The built-in program suite.
    pub fn builtin() -> Self {
        use CheckType::{Float, Int};

        let int = || OptionSpec::parameter().typed(Int);
        let float = || OptionSpec::parameter().typed(Float);
        let param = OptionSpec::parameter;
        let infile = || OptionSpec::parameter().input_file();
        let outfile = || OptionSpec::parameter().output_file();

        let mut registry = Self::new();

        registry.add(
            ProgramSpec::new("polyselect", "polyselect")
                .in_subdir("polyselect")
                .arg("P", int())
                .arg("N", int())
                .arg("degree", int())
                .arg("verbose", OptionSpec::toggle_as("v"))
                .arg("quiet", OptionSpec::toggle_as("q"))
                .arg("threads", OptionSpec::parameter_as("t").typed(Int))
                .arg("admin", int())
                .arg("admax", int())
                .arg("incr", int())
                .arg("nq", int())
                .arg("maxtime", float())
                .arg("printdelay", OptionSpec::parameter_as("s").typed(Int))
                .arg("keep", int())
                .arg("sopteffort", int()),
        );

        registry.add(
            ProgramSpec::new("polyselect_ropt", "polyselect_ropt")
                .in_subdir("polyselect")
                .arg("verbose", OptionSpec::toggle_as("v"))
                .arg("threads", OptionSpec::parameter_as("t").typed(Int))
                .arg("inputpolys", infile())
                .arg("ropteffort", float())
                .arg("area", float())
                .arg("Bf", float())
                .arg("Bg", float()),
        );

        registry.add(
            ProgramSpec::new("polyselect3", "polyselect3")
                .in_subdir("polyselect")
                .arg("verbose", OptionSpec::toggle_as("v"))
                .arg("threads", OptionSpec::parameter_as("t").typed(Int))
                .arg("num", int())
                .arg("poly", infile())
                .arg("Bf", float())
                .arg("Bg", float())
                .arg("area", float()),
        );

        registry.add(
            ProgramSpec::new("polyselect_gfpn", "polyselect_gfpn")
                .in_subdir("polyselect")
                .arg("verbose", OptionSpec::toggle_as("v"))
                .arg("p", int())
                .arg("n", int())
                .arg("out", outfile()),
        );

        registry.add(
            ProgramSpec::new("dlpolyselect", "dlpolyselect")
                .in_subdir("polyselect")
                .arg("verbose", OptionSpec::toggle_as("v"))
                .arg("N", int())
                .arg("easySM", int())
                .arg("df", int())
                .arg("dg", int())
                .arg("area", float())
                .arg("Bf", float())
                .arg("Bg", float())
                .arg("bound", int())
                .arg("modm", int())
                .arg("modr", int())
                .arg("skew", OptionSpec::toggle())
                .arg("threads", OptionSpec::parameter_as("t").typed(Int)),
        );

        registry.add(
            ProgramSpec::new("skewness", "skewness")
                .in_subdir("polyselect")
                .arg("inputpoly", OptionSpec::positional().input_file())
                .arg("outputpoly", OptionSpec::positional().output_file()),
        );

        registry.add(
            ProgramSpec::new("makefb", "makefb")
                .in_subdir("sieve")
                .arg("poly", infile())
                .arg("lim", int())
                .arg("maxbits", int())
                .arg("out", outfile())
                .arg("side", int())
                .arg("threads", OptionSpec::parameter_as("t").typed(Int)),
        );

        registry.add(
            ProgramSpec::new("freerel", "freerel")
                .in_subdir("sieve")
                .arg("poly", infile())
                .arg("renumber", outfile())
                .arg("lpb0", int())
                .arg("lpb1", int())
                .arg("out", outfile())
                .arg("pmin", int())
                .arg("pmax", int())
                .arg("dl", OptionSpec::toggle())
                .arg("threads", OptionSpec::parameter_as("t").typed(Int)),
        );

        registry.add(
            ProgramSpec::new("las", "las")
                .in_subdir("sieve")
                .arg("poly", infile())
                .arg("q0", int())
                .arg("I", int())
                .arg("A", int())
                .arg("q1", int())
                .arg("rho", int())
                .arg("skipped", int())
                .arg("tdthresh", int())
                .arg("bkthresh", int())
                .arg("bkthresh1", int())
                .arg("bkmult", param())
                .arg("lim0", int())
                .arg("lim1", int())
                .arg("lpb0", int())
                .arg("lpb1", int())
                .arg("mfb0", int())
                .arg("mfb1", int())
                .arg("batchlpb0", int())
                .arg("batchlpb1", int())
                .arg("batchmfb0", int())
                .arg("batchmfb1", int())
                .arg("lambda0", float())
                .arg("lambda1", float())
                .arg("ncurves0", int())
                .arg("ncurves1", int())
                .arg("skewness", OptionSpec::parameter_as("S").typed(Float))
                .arg("verbose", OptionSpec::toggle_as("v"))
                .arg("powlim0", int())
                .arg("powlim1", int())
                .arg("factorbase0", OptionSpec::parameter_as("fb0").input_file())
                .arg("factorbase1", OptionSpec::parameter_as("fb1").input_file())
                .arg("out", outfile())
                .arg("threads", OptionSpec::parameter_as("t"))
                .arg("batch", OptionSpec::toggle())
                .arg("batchfile0", infile())
                .arg("batchfile1", infile())
                .arg("sqside", int())
                .arg("dup", OptionSpec::toggle())
                .arg("galois", param())
                .arg("sublat", int())
                .arg("allow_largesq", OptionSpec::toggle_as("allow-largesq"))
                .arg("allow_compsq", OptionSpec::toggle_as("allow-compsq"))
                .arg("qfac_min", OptionSpec::parameter_as("qfac-min").typed(Int))
                .arg("qfac_max", OptionSpec::parameter_as("qfac-max").typed(Int))
                .arg(
                    "adjust_strategy",
                    OptionSpec::parameter_as("adjust-strategy").typed(Int),
                )
                .arg("stats_stderr", OptionSpec::toggle_as("stats-stderr"))
                // <int>,<int> pairs have no check type of their own; they
                // travel as plain strings.
                .arg("traceab", param())
                .arg("traceij", param())
                .arg("traceNx", param())
                // The factor-base cache is a local temp file, reused between
                // runs; neither distributed to clients nor sent back.
                .arg("fbcache", OptionSpec::parameter_as("fbc"))
                .require_one_of(&["I", "A"]),
        );

        registry.add(
            ProgramSpec::new("dup1", "dup1")
                .in_subdir("filter")
                .vararg("args", OptionSpec::positional().input_file())
                .arg("prefix", param())
                .arg("out", param())
                .arg("outfmt", param())
                .arg("bzip", OptionSpec::toggle_as("bz"))
                .arg("only_ab", OptionSpec::toggle_as("ab"))
                .arg("abhexa", OptionSpec::toggle())
                .arg(
                    "force_posix_threads",
                    OptionSpec::toggle_as("force-posix-threads"),
                )
                .arg("only", int())
                .arg("nslices_log", OptionSpec::parameter_as("n").typed(Int))
                .arg("lognrels", int())
                .arg("filelist", infile())
                .arg("basepath", param()),
        );

        registry.add(
            ProgramSpec::new("dup2", "dup2")
                .in_subdir("filter")
                .vararg("args", OptionSpec::positional().input_file())
                .arg("poly", infile())
                .arg("rel_count", OptionSpec::parameter_as("nrels").typed(Int))
                .arg("renumber", infile())
                .arg("filelist", infile())
                .arg(
                    "force_posix_threads",
                    OptionSpec::toggle_as("force-posix-threads"),
                )
                .arg("dlp", OptionSpec::toggle_as("dl")),
        );

        registry.add(
            ProgramSpec::new("filter_galois", "filter_galois")
                .in_subdir("filter")
                .vararg("args", OptionSpec::positional().input_file())
                .arg("nrels", int())
                .arg("poly", infile())
                .arg("renumber", infile())
                .arg("filelist", infile())
                .arg("basepath", param())
                .arg("galois", param()),
        );

        registry.add(
            ProgramSpec::new("purge", "purge")
                .in_subdir("filter")
                .vararg("args", OptionSpec::positional().input_file())
                .arg("out", outfile())
                .arg("filelist", infile())
                .arg("basepath", param())
                .arg("subdirlist", param())
                .arg("nrels", int())
                .arg("outdel", outfile())
                .arg("keep", int())
                .arg("col_minindex", OptionSpec::parameter_as("col-min-index").typed(Int))
                .arg("nprimes", OptionSpec::parameter_as("col-max-index").typed(Int))
                .arg("threads", OptionSpec::parameter_as("t").typed(Int))
                .arg("npass", int())
                .arg(
                    "force_posix_threads",
                    OptionSpec::toggle_as("force-posix-threads"),
                )
                .arg("required_excess", float()),
        );

        registry.add(
            ProgramSpec::new("merge", "merge")
                .in_subdir("filter")
                .arg("purged", OptionSpec::parameter_as("mat").input_file())
                .arg("out", outfile())
                .arg("skip", int())
                .arg("target_density", float())
                .arg("threads", OptionSpec::parameter_as("t").typed(Int))
                .arg(
                    "force_posix_threads",
                    OptionSpec::toggle_as("force-posix-threads"),
                ),
        );

        registry.add(
            ProgramSpec::new("merge-dl", "merge-dl")
                .in_subdir("filter")
                .arg("purged", OptionSpec::parameter_as("mat").input_file())
                .arg("out", outfile())
                .arg("skip", int())
                .arg("target_density", float())
                .arg("threads", OptionSpec::parameter_as("t").typed(Int)),
        );

        registry.add(
            ProgramSpec::new("replay", "replay")
                .in_subdir("filter")
                .arg("purged", param())
                .arg("history", OptionSpec::parameter_as("his"))
                .arg("index", param())
                .arg("out", param())
                .arg("for_msieve", OptionSpec::toggle())
                .arg("skip", int())
                .arg(
                    "force_posix_threads",
                    OptionSpec::toggle_as("force-posix-threads"),
                )
                .arg("bwcostmin", int()),
        );

        registry.add(
            ProgramSpec::new("replay-dl", "replay-dl")
                .in_subdir("filter")
                .arg("purged", param())
                .arg("ideals", param())
                .arg("history", OptionSpec::parameter_as("his"))
                .arg("index", param())
                .arg("out", param())
                .arg("skip", param()),
        );

        // Still used for the unit rank, which bounds the excess relations
        // to keep; the bad-ideal computation moved elsewhere.
        registry.add(
            ProgramSpec::new("numbertheory_tool", "numbertheory_tool")
                .in_subdir("utils")
                .arg("poly", param())
                .arg("ell", param()),
        );

        registry.add(
            ProgramSpec::new("bwc", "bwc.pl")
                .in_subdir("linalg/bwc")
                .windows_run_prefix("perl.exe")
                .windows_suffix("")
                .arg("complete", OptionSpec::toggle().prefix(":"))
                .arg("dryrun", OptionSpec::toggle_as("d"))
                .arg("verbose", OptionSpec::toggle_as("v"))
                .arg("mpi", OptionSpec::equals())
                .arg("lingen_mpi", OptionSpec::equals())
                .arg("allow_zero_on_rhs", OptionSpec::equals())
                .arg("threads", OptionSpec::equals_as("thr"))
                .arg("m", OptionSpec::equals())
                .arg("n", OptionSpec::equals())
                .arg("nullspace", OptionSpec::equals())
                .arg("interval", OptionSpec::equals())
                .arg("ys", OptionSpec::equals())
                .arg("matrix", OptionSpec::equals().host_path())
                .arg("rhs", OptionSpec::equals())
                .arg("prime", OptionSpec::equals())
                .arg("wdir", OptionSpec::equals().host_path())
                .arg("mpiexec", OptionSpec::equals().host_path())
                .arg("hosts", OptionSpec::equals())
                .arg("hostfile", OptionSpec::equals().host_path())
                .arg("interleaving", OptionSpec::equals())
                .arg("bwc_bindir", OptionSpec::equals().host_path())
                .arg("mm_impl", OptionSpec::equals())
                .arg("cpubinding", OptionSpec::equals())
                .arg("precmd", OptionSpec::equals())
                // Absent means a random seed; any fixed value pins it.
                .arg("seed", OptionSpec::equals()),
        );

        registry.add(
            ProgramSpec::new("sm", "sm")
                .in_subdir("filter")
                .arg("poly", param())
                .arg("purged", param())
                .arg("index", param())
                .arg("out", param())
                .arg("ell", param())
                .arg("nsms", param())
                .arg("sm_mode", OptionSpec::parameter_as("sm-mode")),
        );

        registry.add(
            ProgramSpec::new("reconstructlog-dl", "reconstructlog-dl")
                .in_subdir("filter")
                .arg("ell", param())
                .arg("threads", OptionSpec::parameter_as("mt"))
                .arg("ker", OptionSpec::parameter_as("log").input_file())
                .arg("dlog", OptionSpec::parameter_as("out"))
                .arg("renumber", param())
                .arg("poly", param())
                .arg("purged", param())
                .arg("ideals", param())
                .arg("relsdel", param())
                .arg("nrels", param())
                .arg("partial", OptionSpec::toggle())
                .arg("sm_mode", OptionSpec::parameter_as("sm-mode"))
                .arg("nsms", param()),
        );

        registry.add(
            ProgramSpec::new("descent", "descent.py")
                .in_subdir("scripts")
                .arg("target", param().prefix("--"))
                .arg("gfpext", param().prefix("--"))
                .arg("prefix", param().prefix("--"))
                .arg("datadir", param().prefix("--"))
                .arg("cadobindir", param().prefix("--"))
                .arg(
                    "descent_hint",
                    OptionSpec::parameter_as("descent-hint")
                        .prefix("--")
                        .input_file(),
                )
                .arg("init_I", OptionSpec::parameter_as("init-I").prefix("--"))
                .arg(
                    "init_ncurves",
                    OptionSpec::parameter_as("init-ncurves").prefix("--"),
                )
                .arg("init_lpb", OptionSpec::parameter_as("init-lpb").prefix("--"))
                .arg("init_lim", OptionSpec::parameter_as("init-lim").prefix("--"))
                .arg("init_mfb", OptionSpec::parameter_as("init-mfb").prefix("--"))
                .arg(
                    "init_tkewness",
                    OptionSpec::parameter_as("init-tkewness").prefix("--"),
                )
                .arg(
                    "init_minB1",
                    OptionSpec::parameter_as("init-minB1").prefix("--"),
                )
                .arg(
                    "init_mineff",
                    OptionSpec::parameter_as("init-mineff").prefix("--"),
                )
                .arg(
                    "init_maxeff",
                    OptionSpec::parameter_as("init-maxeff").prefix("--"),
                )
                .arg(
                    "init_side",
                    OptionSpec::parameter_as("init-side").prefix("--"),
                )
                .arg("sm_mode", OptionSpec::parameter_as("sm-mode").prefix("--"))
                .arg("I", param().prefix("--"))
                .arg("lpb0", param().prefix("--"))
                .arg("lpb1", param().prefix("--"))
                .arg("mfb0", param().prefix("--"))
                .arg("mfb1", param().prefix("--"))
                .arg("lim0", param().prefix("--"))
                .arg("lim1", param().prefix("--"))
                .arg("ell", param().prefix("--")),
        );

        registry.add(
            ProgramSpec::new("characters", "characters")
                .in_subdir("linalg")
                .arg("poly", param())
                .arg("purged", param())
                .arg("index", param())
                .arg("heavyblock", param())
                .arg("out", param())
                .arg("wfile", OptionSpec::parameter_as("ker"))
                .arg("lpb0", param())
                .arg("lpb1", param())
                .arg("nchar", param())
                .arg("nratchars", param())
                .arg("threads", OptionSpec::parameter_as("t")),
        );

        registry.add(
            ProgramSpec::new("sqrt", "sqrt")
                .in_subdir("sqrt")
                .arg("poly", param())
                .arg("prefix", param())
                .arg("purged", param())
                .arg("index", param())
                .arg("kernel", OptionSpec::parameter_as("ker"))
                .arg("dep", param())
                .arg("threads", OptionSpec::parameter_as("t").typed(Int))
                .arg("ab", OptionSpec::toggle())
                .arg("side0", OptionSpec::toggle())
                .arg("side1", OptionSpec::toggle())
                .arg("gcd", OptionSpec::toggle()),
        );

        registry.add(
            ProgramSpec::new("cado_nfs_client", "cado-nfs-client.py")
                .windows_run_prefix("python3.exe")
                .arg("server", param().prefix("--"))
                .arg("daemon", OptionSpec::toggle().prefix("--"))
                .arg("keepoldresult", OptionSpec::toggle().prefix("--"))
                .arg("nosha1check", OptionSpec::toggle().prefix("--"))
                .arg("dldir", param().prefix("--"))
                .arg("workdir", param().prefix("--"))
                .arg("bindir", param().prefix("--"))
                .arg("clientid", param().prefix("--"))
                .arg("basepath", param().prefix("--"))
                .arg("getwupath", param().prefix("--"))
                .arg("loglevel", param().prefix("--"))
                .arg("postresultpath", param().prefix("--"))
                .arg("downloadretry", param().prefix("--"))
                .arg("logfile", param().prefix("--"))
                .arg("debug", param().prefix("--"))
                .arg("niceness", param().prefix("--"))
                .arg("ping", param().prefix("--"))
                .arg("wu_filename", param().prefix("--"))
                .arg("arch", param().prefix("--"))
                .arg("certsha1", param().prefix("--")),
        );

        registry.add(
            ProgramSpec::new("ssh", "ssh")
                .with_search_path("/usr/bin")
                .arg("host", OptionSpec::positional())
                .vararg("args", OptionSpec::positional())
                .arg("compression", OptionSpec::toggle_as("C"))
                .arg("verbose", OptionSpec::toggle_as("v"))
                .arg("cipher", OptionSpec::parameter_as("c"))
                .arg("configfile", OptionSpec::parameter_as("F"))
                .arg("identity_file", OptionSpec::parameter_as("i"))
                .arg("login_name", OptionSpec::parameter_as("l"))
                .arg("port", OptionSpec::parameter_as("p")),
        );

        registry.add(
            ProgramSpec::new("rsync", "rsync")
                .with_search_path("/usr/bin")
                .arg("sourcefile", OptionSpec::positional())
                .arg("remotefile", OptionSpec::positional()),
        );

        registry.add(
            ProgramSpec::new("ls", "ls")
                .with_search_path("/bin")
                .vararg("args", OptionSpec::positional())
                .arg("long", OptionSpec::toggle_as("l")),
        );

        registry.add(
            ProgramSpec::new("kill", "kill")
                .with_search_path("/bin")
                .vararg("args", OptionSpec::positional())
                .arg("signal", OptionSpec::parameter_as("s")),
        );

        registry
    }
}

lazy_static! {
    /// The process-wide built-in registry.
    pub static ref BUILTIN_PROGRAMS: ProgramRegistry = ProgramRegistry::builtin();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FileRole;

    #[test]
    fn test_builtin_registry_contains_the_suite() {
        for name in [
            "polyselect",
            "makefb",
            "freerel",
            "las",
            "purge",
            "merge",
            "bwc",
            "sqrt",
            "cado_nfs_client",
            "ls",
        ] {
            assert!(BUILTIN_PROGRAMS.get(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn test_registration_binds_keys() {
        let makefb = BUILTIN_PROGRAMS.get("makefb").unwrap();
        let poly = makefb.option("poly").unwrap();
        assert_eq!(poly.key(), Some("poly"));
        assert_eq!(poly.role(), FileRole::Input);
    }

    #[test]
    fn test_invalid_name_is_rejected() {
        let mut registry = ProgramRegistry::new();
        let err = registry
            .register(ProgramSpec::new("3dup", "dup"))
            .unwrap_err();
        assert_eq!(err, RegistryError::InvalidName("3dup".to_string()));
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut registry = ProgramRegistry::new();
        registry.register(ProgramSpec::new("ls", "ls")).unwrap();
        let err = registry.register(ProgramSpec::new("ls", "ls")).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateProgram("ls".to_string()));
    }

    #[test]
    fn test_accepted_keys_include_exec_overrides() {
        let ls = BUILTIN_PROGRAMS.get("ls").unwrap();
        let keys = ls.accepted_keys();
        assert!(keys.iter().any(|(k, _)| k == "long"));
        assert!(keys.iter().any(|(k, _)| k == "execpath"));
        // The variadic entry cannot come from a parameter file.
        assert!(!keys.iter().any(|(k, _)| k == "args"));
    }

    #[test]
    fn test_las_requires_sieve_region() {
        let las = BUILTIN_PROGRAMS.get("las").unwrap();
        assert_eq!(
            las.required_one_of(),
            &["I".to_string(), "A".to_string()][..]
        );
    }
}
