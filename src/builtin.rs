use crate::command::ExitCode;
use crate::env::Environment;
use crate::error::CdError;
use anyhow::{Result, anyhow};
use std::env;
use std::io::Write;
use std::path::PathBuf;

/// How a line is recognised as the `cd` builtin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CdMatching {
    /// The first word of the line is exactly `cd`.
    #[default]
    Word,
    /// The line starts with the characters `cd`, so `cdfoo` means `cd foo`.
    Prefix,
}

/// Built-in commands known to the shell at compile time.
///
/// Builtins run inside the shell process, never in a child: `cd` has to change
/// the shell's own working directory.
pub(crate) trait BuiltinCommand: Sized {
    /// Canonical name of the command, e.g. "pwd" or "cd".
    fn name() -> &'static str;

    /// Recognise the raw command line, returning `None` when it is not this builtin.
    fn parse(line: &str, matching: CdMatching) -> Option<Self>;

    /// Executes the command.
    ///
    /// Return value follows shell conventions: 0 for success, non-zero for error.
    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode>;
}

/// Leave the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bye;

impl BuiltinCommand for Bye {
    fn name() -> &'static str {
        "bye"
    }

    fn parse(line: &str, _matching: CdMatching) -> Option<Self> {
        (line == Self::name()).then_some(Bye)
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        env.should_exit = true;
        Ok(0)
    }
}

/// Print the current working directory to standard output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pwd;

impl BuiltinCommand for Pwd {
    fn name() -> &'static str {
        "pwd"
    }

    fn parse(line: &str, _matching: CdMatching) -> Option<Self> {
        (line == Self::name()).then_some(Pwd)
    }

    fn execute(self, stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        let cwd = env
            .refresh_current_dir()
            .map_err(|err| anyhow!("pwd: {err}"))?;
        writeln!(stdout, "{}", cwd.display())?;
        Ok(0)
    }
}

/// Change the current working directory.
///
/// An empty target means `$HOME`; a leading `~` is replaced by `$HOME`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cd {
    pub target: String,
}

impl Cd {
    /// Resolve the target against `HOME` the way the builtin does before `chdir`.
    pub fn resolve_target(&self, env: &Environment) -> Result<PathBuf, CdError> {
        let home = || env.get_var("HOME").ok_or(CdError::HomeNotSet);
        if self.target.is_empty() {
            Ok(PathBuf::from(home()?))
        } else if let Some(rest) = self.target.strip_prefix('~') {
            Ok(PathBuf::from(format!("{}{rest}", home()?)))
        } else {
            Ok(PathBuf::from(&self.target))
        }
    }

    fn change_dir(&self, env: &mut Environment) -> Result<(), CdError> {
        let path = self.resolve_target(env)?;
        env::set_current_dir(&path).map_err(|source| CdError::ChangeDir {
            path: path.clone(),
            source,
        })?;
        if env.refresh_current_dir().is_err() {
            env.current_dir = path;
        }
        tracing::debug!(cwd = %env.current_dir.display(), "changed directory");
        Ok(())
    }
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn parse(line: &str, matching: CdMatching) -> Option<Self> {
        let target = match matching {
            CdMatching::Prefix => line.strip_prefix(Self::name())?.trim_start_matches(' '),
            CdMatching::Word => {
                let rest = line.trim_start().strip_prefix(Self::name())?;
                if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
                    return None;
                }
                rest.trim()
            }
        };
        Some(Cd {
            target: target.to_owned(),
        })
    }

    fn execute(self, _stdout: &mut dyn Write, env: &mut Environment) -> Result<ExitCode> {
        self.change_dir(env)?;
        Ok(0)
    }
}

/// A command line recognised as one of the builtins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuiltinAction {
    Bye(Bye),
    Pwd(Pwd),
    Cd(Cd),
}

impl BuiltinAction {
    pub fn name(&self) -> &'static str {
        match self {
            BuiltinAction::Bye(_) => Bye::name(),
            BuiltinAction::Pwd(_) => Pwd::name(),
            BuiltinAction::Cd(_) => Cd::name(),
        }
    }

    /// Run the builtin. Failures are written to `stderr` and turn into exit
    /// code 1; they never reach the session loop as errors.
    pub fn execute(
        self,
        stdout: &mut dyn Write,
        stderr: &mut dyn Write,
        env: &mut Environment,
    ) -> std::io::Result<ExitCode> {
        let result = match self {
            BuiltinAction::Bye(cmd) => cmd.execute(stdout, env),
            BuiltinAction::Pwd(cmd) => cmd.execute(stdout, env),
            BuiltinAction::Cd(cmd) => cmd.execute(stdout, env),
        };
        match result {
            Ok(code) => Ok(code),
            Err(e) => {
                writeln!(stderr, "{e}")?;
                Ok(1)
            }
        }
    }
}

/// Look `line` up in the builtin table.
///
/// `bye` and `pwd` must match the whole line exactly; `cd` follows `matching`.
pub fn resolve(line: &str, matching: CdMatching) -> Option<BuiltinAction> {
    if let Some(cmd) = Bye::parse(line, matching) {
        return Some(BuiltinAction::Bye(cmd));
    }
    if let Some(cmd) = Pwd::parse(line, matching) {
        return Some(BuiltinAction::Pwd(cmd));
    }
    Cd::parse(line, matching).map(BuiltinAction::Cd)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env as stdenv;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, MutexGuard, OnceLock};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn make_unique_temp_dir(tag: &str) -> io::Result<PathBuf> {
        let mut p = stdenv::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("ssi_test_{}_{}_{}", tag, std::process::id(), nanos));
        fs::create_dir_all(&p)?;
        fs::canonicalize(&p)
    }

    fn env_with_home(home: Option<&str>) -> Environment {
        let mut vars = HashMap::new();
        if let Some(home) = home {
            vars.insert("HOME".to_string(), home.to_string());
        }
        Environment {
            vars,
            current_dir: stdenv::current_dir().unwrap(),
            should_exit: false,
        }
    }

    fn run(
        action: BuiltinAction,
        env: &mut Environment,
    ) -> (ExitCode, String, String) {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let code = action.execute(&mut out, &mut err, env).unwrap();
        (
            code,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_exact_matches() {
        assert_eq!(resolve("bye", CdMatching::Word), Some(BuiltinAction::Bye(Bye)));
        assert_eq!(resolve("pwd", CdMatching::Word), Some(BuiltinAction::Pwd(Pwd)));
        assert_eq!(resolve("bye now", CdMatching::Word), None);
        assert_eq!(resolve(" pwd", CdMatching::Word), None);
        assert_eq!(resolve("pwd -L", CdMatching::Prefix), None);
        assert_eq!(resolve("ls -la", CdMatching::Word), None);
        assert_eq!(resolve("", CdMatching::Word), None);
    }

    #[test]
    fn test_cd_word_matching() {
        let cd = |line| match resolve(line, CdMatching::Word) {
            Some(BuiltinAction::Cd(cd)) => Some(cd.target),
            _ => None,
        };
        assert_eq!(cd("cd"), Some(String::new()));
        assert_eq!(cd("cd /tmp"), Some("/tmp".to_string()));
        assert_eq!(cd("cd    ~/sub  "), Some("~/sub".to_string()));
        assert_eq!(cd("  cd\t/var"), Some("/var".to_string()));
        assert_eq!(cd("cd my dir"), Some("my dir".to_string()));
        assert_eq!(cd("cdfoo"), None);
        assert_eq!(cd("cdrecord -v"), None);
    }

    #[test]
    fn test_cd_prefix_matching_keeps_historical_quirk() {
        let cd = |line| match resolve(line, CdMatching::Prefix) {
            Some(BuiltinAction::Cd(cd)) => Some(cd.target),
            _ => None,
        };
        assert_eq!(cd("cd"), Some(String::new()));
        assert_eq!(cd("cd   /tmp"), Some("/tmp".to_string()));
        assert_eq!(cd("cdfoo"), Some("foo".to_string()));
        assert_eq!(cd(" cd /tmp"), None);
    }

    #[test]
    fn test_resolve_target() {
        let env = env_with_home(Some("/home/u"));
        let target = |t: &str| Cd { target: t.to_string() }.resolve_target(&env).unwrap();
        assert_eq!(target(""), PathBuf::from("/home/u"));
        assert_eq!(target("~"), PathBuf::from("/home/u"));
        assert_eq!(target("~/sub"), PathBuf::from("/home/u/sub"));
        assert_eq!(target("/etc"), PathBuf::from("/etc"));
        assert_eq!(target("rel/dir"), PathBuf::from("rel/dir"));

        let no_home = env_with_home(None);
        let err = Cd { target: String::new() }.resolve_target(&no_home).unwrap_err();
        assert!(matches!(err, CdError::HomeNotSet));
        let err = Cd { target: "~/x".into() }.resolve_target(&no_home).unwrap_err();
        assert!(matches!(err, CdError::HomeNotSet));
    }

    #[test]
    fn test_pwd_prints_current_dir() {
        let _lock = lock_current_dir();
        let cur = stdenv::current_dir().unwrap();
        let mut env = env_with_home(None);

        let (code, out, err) = run(BuiltinAction::Pwd(Pwd), &mut env);

        assert_eq!(code, 0);
        assert_eq!(out, format!("{}\n", cur.display()));
        assert!(err.is_empty());
        assert_eq!(env.current_dir, cur);
    }

    #[test]
    fn test_cd_to_home_when_empty() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir("cd_home").unwrap();
        let orig = stdenv::current_dir().unwrap();
        let mut env = env_with_home(Some(temp.to_str().unwrap()));

        let (code, _, err) = run(resolve("cd", CdMatching::Word).unwrap(), &mut env);
        let now = stdenv::current_dir().unwrap();
        let (_, pwd_out, _) = run(BuiltinAction::Pwd(Pwd), &mut env);
        stdenv::set_current_dir(&orig).unwrap();

        assert_eq!(code, 0, "stderr: {err}");
        assert_eq!(now, temp);
        assert_eq!(pwd_out, format!("{}\n", temp.display()));
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_tilde_expands_home() {
        let _lock = lock_current_dir();
        let temp = make_unique_temp_dir("cd_tilde").unwrap();
        fs::create_dir_all(temp.join("sub")).unwrap();
        let orig = stdenv::current_dir().unwrap();
        let mut env = env_with_home(Some(temp.to_str().unwrap()));

        let (code, _, err) = run(resolve("cd ~/sub", CdMatching::Word).unwrap(), &mut env);
        let now = stdenv::current_dir().unwrap();
        stdenv::set_current_dir(&orig).unwrap();

        assert_eq!(code, 0, "stderr: {err}");
        assert_eq!(now, temp.join("sub"));
        assert_eq!(env.current_dir, temp.join("sub"));
        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_cd_nonexistent_path_reports_and_stays() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let mut env = env_with_home(None);

        let (code, out, err) = run(
            resolve("cd /nonexistent_dir_for_ssi_test", CdMatching::Word).unwrap(),
            &mut env,
        );

        assert_eq!(code, 1);
        assert!(out.is_empty());
        assert!(err.starts_with("cd: /nonexistent_dir_for_ssi_test: "), "{err}");
        assert_eq!(stdenv::current_dir().unwrap(), orig);
        assert!(!env.should_exit);
    }

    #[test]
    fn test_cd_without_home_reports() {
        let _lock = lock_current_dir();
        let orig = stdenv::current_dir().unwrap();
        let mut env = env_with_home(None);

        let (code, _, err) = run(resolve("cd", CdMatching::Word).unwrap(), &mut env);

        assert_eq!(code, 1);
        assert_eq!(err, "cd: HOME not set\n");
        assert_eq!(stdenv::current_dir().unwrap(), orig);
    }

    #[test]
    fn test_bye_sets_exit_flag() {
        let mut env = env_with_home(None);
        let (code, out, _) = run(resolve("bye", CdMatching::Word).unwrap(), &mut env);
        assert_eq!(code, 0);
        assert!(out.is_empty());
        assert!(env.should_exit);
    }
}
