use std::collections::HashMap;
use std::io;
use std::io::{BufRead, Write};

use anyhow::{anyhow, bail, Error};

use eigen_core::{Arity, Visibility};
use eigen_runtime::heap::ObjectRef;
use eigen_runtime::universe::Universe;
use eigen_runtime::value::Value;

const HELP: &str = "\
commands:
  class NAME [< SUPER]       define (or reopen) a class
  module NAME                define (or reopen) a module
  include CLASS MODULE       mix a module into a class or module
  extend VAR MODULE          mix a module into the eigenclass of a value
  def CLASS NAME VALUE       define an instance method returning VALUE
  defs VAR NAME VALUE        define a singleton method returning VALUE
  private CLASS NAME         change the visibility of an instance method
  (also public, protected)
  missing CLASS PREFIX       handle unknown messages by answering PREFIX + name
  new VAR CLASS [ARGS...]    instantiate a class into a variable
  send VAR NAME [ARGS...]    send a message from the top level
  responds VAR NAME          whether a value responds to a message
  ancestors VAR              the ancestors of a class (or lookup chain of a value)
  methods VAR                the public methods of a value
  help                       show this message
  exit                       leave the shell
values: \"strings\", integers, floats, :symbols, nil, true, false, variables, constants";

/// What to do after a command ran.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Keep reading commands, optionally displaying an output.
    Continue(Option<String>),
    /// Leave the shell.
    Exit,
}

/// A line-oriented command interpreter driving a universe.
pub struct Shell {
    universe: Universe,
    variables: HashMap<String, Value>,
}

impl Shell {
    /// Create a shell around the given universe.
    pub fn new(universe: Universe) -> Self {
        Self {
            universe,
            variables: HashMap::new(),
        }
    }

    /// Run every command read from `input`, printing outputs and errors.
    ///
    /// A prompt is displayed before each command when `interactive` is set.
    pub fn run(&mut self, mut input: impl BufRead, interactive: bool) -> Result<(), Error> {
        let stdout = io::stdout();
        let mut stdout = stdout.lock();

        let mut counter = 0;
        let mut line = String::new();
        loop {
            if interactive {
                write!(&mut stdout, "({}) eigen | ", counter)?;
                stdout.flush()?;
            }
            line.clear();
            input.read_line(&mut line)?;
            if line.is_empty() {
                if interactive {
                    writeln!(&mut stdout, "exit")?;
                }
                break;
            }

            match self.execute(&line) {
                Ok(Flow::Continue(Some(output))) => writeln!(&mut stdout, "=> {}", output)?,
                Ok(Flow::Continue(None)) => {}
                Ok(Flow::Exit) => break,
                Err(err) => writeln!(&mut stdout, "ERROR: {}", err)?,
            }
            counter += 1;
        }

        Ok(())
    }

    /// Run a single command.
    pub fn execute(&mut self, line: &str) -> Result<Flow, Error> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(Flow::Continue(None));
        }
        let tokens = tokenize(line)?;
        let (command, args) = match tokens.split_first() {
            Some((command, args)) => (command.as_str(), args),
            None => return Ok(Flow::Continue(None)),
        };

        let output = match (command, args) {
            ("exit", []) => return Ok(Flow::Exit),
            ("help", []) => Some(HELP.to_string()),
            ("class", [name]) => {
                let class = self.universe.define_class(name, None)?;
                Some(self.universe.display_name(class))
            }
            ("class", [name, lt, super_class]) if lt == "<" => {
                let super_class = self.class(super_class)?;
                let class = self.universe.define_class(name, Some(super_class))?;
                Some(self.universe.display_name(class))
            }
            ("module", [name]) => {
                let module = self.universe.define_module(name)?;
                Some(self.universe.display_name(module))
            }
            ("include", [class, module]) => {
                let class = self.class(class)?;
                let module = self.class(module)?;
                self.universe.include(class, module)?;
                None
            }
            ("extend", [variable, module]) => {
                let value = self.value(variable)?;
                let module = self.class(module)?;
                self.universe.extend(&value, module)?;
                None
            }
            ("def", [class, name, value]) => {
                let class = self.class(class)?;
                let value = self.value(value)?;
                self.universe.define_method(class, name, Arity::AtLeast(0), move |_, _, _| {
                    Ok(value.clone())
                })?;
                Some(format!(":{}", name))
            }
            ("defs", [variable, name, value]) => {
                let target = self.value(variable)?;
                let value = self.value(value)?;
                self.universe
                    .define_singleton_method(&target, name, Arity::AtLeast(0), move |_, _, _| {
                        Ok(value.clone())
                    })?;
                Some(format!(":{}", name))
            }
            ("public", [class, name]) | ("protected", [class, name]) | ("private", [class, name]) => {
                let visibility = Visibility::from_keyword(command).unwrap_or_default();
                let class = self.class(class)?;
                self.universe.set_visibility(class, name, visibility)?;
                None
            }
            ("missing", [class, prefix]) => {
                let class = self.class(class)?;
                let prefix = prefix.clone();
                self.universe
                    .define_missing_handler(class, move |universe, _, signature, _| {
                        let name = universe.lookup_symbol(signature);
                        Ok(Value::new_string(format!("{}{}", prefix, name)))
                    })?;
                None
            }
            ("new", [variable, class, rest @ ..]) => {
                let class = self.value(class)?;
                let args = self.values(rest)?;
                let instance = self.universe.dispatch(class, "new", args)?;
                let output = self.universe.inspect(&instance);
                self.variables.insert(variable.clone(), instance);
                Some(output)
            }
            ("send", [variable, name, rest @ ..]) => {
                let receiver = self.value(variable)?;
                let args = self.values(rest)?;
                let output = self.universe.dispatch(receiver, name, args)?;
                Some(self.universe.inspect(&output))
            }
            ("responds", [variable, name]) => {
                let value = self.value(variable)?;
                let responds = self.universe.responds_to(&value, name, false)?;
                Some(responds.to_string())
            }
            ("ancestors", [variable]) => {
                let value = self.value(variable)?;
                let chain = match value.as_object() {
                    Some(object) if self.universe.class(object).is_ok() => {
                        self.universe.ancestors(object)?
                    }
                    _ => self.universe.lookup_chain(&value)?,
                };
                let names: Vec<String> = chain
                    .into_iter()
                    .map(|holder| self.universe.display_name(holder))
                    .collect();
                Some(format!("[{}]", names.join(", ")))
            }
            ("methods", [variable]) => {
                let value = self.value(variable)?;
                let names: Vec<String> = self
                    .universe
                    .methods(&value)?
                    .into_iter()
                    .map(|name| format!(":{}", name))
                    .collect();
                Some(format!("[{}]", names.join(", ")))
            }
            _ => bail!("unknown command or wrong arguments: '{}' (try 'help')", line),
        };

        Ok(Flow::Continue(output))
    }

    fn value(&mut self, token: &str) -> Result<Value, Error> {
        if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
            return Ok(Value::new_string(&token[1..token.len() - 1]));
        }
        match token {
            "nil" => return Ok(Value::Nil),
            "true" => return Ok(Value::Boolean(true)),
            "false" => return Ok(Value::Boolean(false)),
            _ => {}
        }
        if let Some(symbol) = token.strip_prefix(':') {
            if !symbol.is_empty() {
                return Ok(Value::Symbol(self.universe.intern_symbol(symbol)));
            }
        }
        if let Ok(value) = token.parse::<i64>() {
            return Ok(Value::Integer(value));
        }
        if token.contains('.') {
            if let Ok(value) = token.parse::<f64>() {
                return Ok(Value::Double(value));
            }
        }
        if let Some(value) = self.variables.get(token) {
            return Ok(value.clone());
        }
        self.universe
            .lookup_constant(token)
            .ok_or_else(|| anyhow!("undefined variable or constant '{}'", token))
    }

    fn values(&mut self, tokens: &[String]) -> Result<Vec<Value>, Error> {
        tokens.iter().map(|token| self.value(token)).collect()
    }

    fn class(&mut self, token: &str) -> Result<ObjectRef, Error> {
        match self.value(token)?.as_object() {
            Some(object) if self.universe.class(object).is_ok() => Ok(object),
            _ => bail!("'{}' is not a class or module", token),
        }
    }
}

/// Split a command line on whitespace, keeping double-quoted strings (quotes included) together.
fn tokenize(line: &str) -> Result<Vec<String>, Error> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();
    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }
        let mut token = String::new();
        if ch == '"' {
            token.push(ch);
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => {
                        token.push('"');
                        break;
                    }
                    Some(ch) => token.push(ch),
                    None => bail!("unterminated string literal"),
                }
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                token.push(ch);
                chars.next();
            }
        }
        tokens.push(token);
    }
    Ok(tokens)
}
