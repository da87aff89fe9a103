//! Demonstration scenarios

use anyhow::{Result, bail};
use clap::ValueEnum;
use otter_proxy::presets;
use otter_proxy::{
    Function, InterceptingHandle, KeyGuard, ProxyConfig, ProxyError, Record, Scheduler,
    SchedulerConfig, SharedRecord, TrapSet, Value, reflect,
};
use std::io::Write;
use std::time::Duration;

/// Scenario selector
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// No traps: the handle behaves like its target
    Transparent,
    /// Missing array indices read as 0
    DefaultValue,
    /// Unknown phrases translate to themselves
    Dictionary,
    /// Only numbers may be written
    Validation,
    /// Internal keys are left out of enumeration
    HiddenKeys,
    /// Invented keys with and without descriptors
    EnumerateDescribe,
    /// Internal keys cannot be read, written, or deleted
    Protected,
    /// Membership means "between start and end"
    Range,
    /// Calls are dispatched after a delay
    Delayed,
    /// Every scenario in order
    All,
}

/// Concrete scenarios, in the order `all` runs them
static EVERY: [Scenario; 9] = [
    Scenario::Transparent,
    Scenario::DefaultValue,
    Scenario::Dictionary,
    Scenario::Validation,
    Scenario::HiddenKeys,
    Scenario::EnumerateDescribe,
    Scenario::Protected,
    Scenario::Range,
    Scenario::Delayed,
];

impl Scenario {
    /// Concrete scenarios this selector stands for
    pub fn expand(&self) -> &'static [Scenario] {
        match self {
            Scenario::All => &EVERY,
            single => {
                let index = EVERY.iter().position(|s| s == single).unwrap_or_default();
                &EVERY[index..=index]
            }
        }
    }

    /// Human readable name
    pub fn title(&self) -> &'static str {
        match self {
            Scenario::Transparent => "transparent",
            Scenario::DefaultValue => "default-value",
            Scenario::Dictionary => "dictionary",
            Scenario::Validation => "validation",
            Scenario::HiddenKeys => "hidden-keys",
            Scenario::EnumerateDescribe => "enumerate-describe",
            Scenario::Protected => "protected",
            Scenario::Range => "range",
            Scenario::Delayed => "delayed",
            Scenario::All => "all",
        }
    }
}

/// Settings shared by the scenarios
pub struct Context {
    guard: KeyGuard,
    scheduler: SchedulerConfig,
}

impl Context {
    pub fn from_config(config: &ProxyConfig) -> Result<Self> {
        Ok(Self {
            guard: KeyGuard::from_config(&config.protection)?,
            scheduler: config.scheduler.clone(),
        })
    }
}

pub fn run(scenario: Scenario, context: &Context, out: &mut dyn Write) -> Result<()> {
    match scenario {
        Scenario::Transparent => transparent(out),
        Scenario::DefaultValue => default_value(out),
        Scenario::Dictionary => dictionary(out),
        Scenario::Validation => validation(out),
        Scenario::HiddenKeys => hidden_keys(context, out),
        Scenario::EnumerateDescribe => enumerate_describe(out),
        Scenario::Protected => protected(context, out),
        Scenario::Range => range(out),
        Scenario::Delayed => delayed(context, out),
        Scenario::All => bail!("'all' must be expanded before running"),
    }
}

fn json(record: &SharedRecord) -> Result<String> {
    Ok(serde_json::to_string(&Value::Record(record.clone()).to_json()?)?)
}

fn user() -> SharedRecord {
    [
        ("name", Value::from("John")),
        ("age", Value::from(30)),
        ("_password", Value::from("***")),
    ]
    .into_iter()
    .collect::<Record>()
    .into_shared()
}

fn transparent(out: &mut dyn Write) -> Result<()> {
    let target = Record::new().into_shared();
    let handle = InterceptingHandle::over_record(&target, TrapSet::new());
    handle.write("test", 2)?;
    writeln!(out, "handle.test = {:?}, target.test = {:?}", handle.read("test")?, target.borrow().get(&"test".into()))?;
    for key in handle.visible_keys()? {
        writeln!(out, "key: {key}")?;
    }
    Ok(())
}

fn default_value(out: &mut dyn Write) -> Result<()> {
    let numbers = Record::array([1, 2, 3, 4]).into_shared();
    let handle = InterceptingHandle::over_record(&numbers, presets::default_value(0));
    writeln!(out, "numbers[1] = {}", handle.read(1)?)?;
    writeln!(out, "numbers[100] = {}", handle.read(100)?)?;
    Ok(())
}

fn dictionary(out: &mut dyn Write) -> Result<()> {
    let dictionary = [("hi", "hola"), ("bye", "adios")]
        .into_iter()
        .collect::<Record>()
        .into_shared();
    let handle = InterceptingHandle::over_record(&dictionary, presets::echo_missing_key());
    for phrase in ["hi", "bye", "how are you"] {
        writeln!(out, "{phrase} -> {}", handle.read(phrase)?)?;
    }
    Ok(())
}

fn validation(out: &mut dyn Write) -> Result<()> {
    let numbers = Record::array([1]).into_shared();
    let handle = InterceptingHandle::over_record(&numbers, presets::numbers_only());
    for value in [Value::from(2), Value::from("string"), Value::record(Record::new())] {
        match handle.push(value.clone()) {
            Ok(index) => writeln!(out, "push({value:?}) -> index {index}")?,
            Err(err) => writeln!(out, "push({value:?}) -> {err}")?,
        }
        writeln!(out, "  numbers = {}", json(&numbers)?)?;
    }
    Ok(())
}

fn hidden_keys(context: &Context, out: &mut dyn Write) -> Result<()> {
    let handle = InterceptingHandle::over_record(&user(), presets::hide_keys(context.guard.clone()));
    writeln!(out, "keys: {:?}", handle.list_keys()?.to_strings())?;
    Ok(())
}

fn enumerate_describe(out: &mut dyn Write) -> Result<()> {
    let invent = || {
        TrapSet::new().on_enumerate_keys(|_| Ok(vec!["a".into(), "b".into(), "c".into()]))
    };

    let bare = InterceptingHandle::over_record(&Record::new().into_shared(), invent());
    writeln!(out, "ownKeys only: {:?}", bare.visible_keys()?)?;

    let described = InterceptingHandle::over_record(
        &Record::new().into_shared(),
        invent().merge(presets::always_enumerable()),
    );
    writeln!(out, "ownKeys + descriptors: {:?}", described.visible_keys()?)?;
    Ok(())
}

fn protected(context: &Context, out: &mut dyn Write) -> Result<()> {
    let target = [("name", "John"), ("_password", "secret")]
        .into_iter()
        .collect::<Record>()
        .into_shared();
    let has_password = Function::new("hasPassword", |this, _args| {
        let password = reflect::get(this, &"_password".into())?;
        Ok(Value::boolean(password.to_boolean()))
    });
    target.borrow_mut().set("hasPassword", has_password);

    let handle = InterceptingHandle::over_record(&target, presets::protect(context.guard.clone()));
    handle.write("age", 23)?;
    writeln!(out, "age = {}", handle.read("age")?)?;

    for attempt in [handle.read("_password").map(|_| ()), handle.write("_age", 23), handle.remove("_password").map(|_| ())] {
        match attempt {
            Err(err @ ProxyError::AccessDenied { .. }) => writeln!(out, "denied: {err}")?,
            Err(err) => return Err(err.into()),
            Ok(()) => bail!("protected key was accessible"),
        }
    }

    let method = handle.read("hasPassword")?;
    if let Some(method) = method.as_function() {
        writeln!(out, "hasPassword() = {}", method.call(&Value::undefined(), &[])?)?;
    }
    writeln!(out, "keys: {:?}", handle.visible_keys()?)?;
    Ok(())
}

fn range(out: &mut dyn Write) -> Result<()> {
    let range = [("start", 1), ("end", 10)].into_iter().collect::<Record>().into_shared();
    let handle = InterceptingHandle::over_record(&range, presets::range_membership("start", "end"));
    for n in [5, 15, 2] {
        writeln!(out, "{n} in range = {}", handle.contains(n)?)?;
    }
    Ok(())
}

fn delayed(context: &Context, out: &mut dyn Write) -> Result<()> {
    let scheduler = Scheduler::with_config(context.scheduler.clone());
    let greeted = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = greeted.clone();
    let say_hi = Function::new("sayHi", move |_this, args| {
        let who = args.first().cloned().unwrap_or_default();
        sink.borrow_mut().push(format!("Hello, {who}!"));
        Ok(Value::undefined())
    });

    let handle = InterceptingHandle::over_function(
        say_hi,
        presets::delayed(&scheduler, Duration::from_millis(300)),
    );
    handle.invoke(&[Value::from("John")], &Value::undefined())?;
    writeln!(out, "invoked, pending timers: {}", scheduler.pending())?;

    let report = scheduler.run_until_idle();
    if let Some(err) = report.errors.into_iter().next() {
        return Err(err.into());
    }
    for line in greeted.borrow().iter() {
        writeln!(out, "{line} (after {:?})", scheduler.now())?;
    }
    Ok(())
}
