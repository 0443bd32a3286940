//! Semantic validation of parsed pipeline configs.

use pipeset_core::pipeline::UnknownFields;
use pipeset_core::{ConfigWarning, PipelineConfig};
use std::collections::{HashMap, HashSet};

/// Validate `config`, returning non-fatal warnings and fatal error messages.
pub fn validate(config: &PipelineConfig) -> (Vec<ConfigWarning>, Vec<String>) {
    let mut warnings = Vec::new();
    let mut errors = Vec::new();

    check_duplicates(
        "groups",
        config.groups.iter().map(|g| g.name.as_str()),
        &mut errors,
    );
    check_duplicates(
        "resources",
        config.resources.iter().map(|r| r.name.as_str()),
        &mut errors,
    );
    check_duplicates(
        "resource_types",
        config.resource_types.iter().map(|t| t.name.as_str()),
        &mut errors,
    );
    check_duplicates(
        "jobs",
        config.jobs.iter().map(|j| j.name.as_str()),
        &mut errors,
    );

    validate_resources(config, &mut errors);
    validate_groups(config, &mut errors);
    validate_jobs(config, &mut warnings, &mut errors);

    (warnings, errors)
}

/// Dotted paths of every key the config model did not recognise.
pub fn unknown_fields(config: &PipelineConfig) -> Vec<String> {
    let mut found = Vec::new();
    collect_unknown("", &config.extra, &mut found);

    for (i, group) in config.groups.iter().enumerate() {
        collect_unknown(&format!("groups[{}].", i), &group.extra, &mut found);
    }
    for (i, resource) in config.resources.iter().enumerate() {
        collect_unknown(&format!("resources[{}].", i), &resource.extra, &mut found);
    }
    for (i, resource_type) in config.resource_types.iter().enumerate() {
        collect_unknown(
            &format!("resource_types[{}].", i),
            &resource_type.extra,
            &mut found,
        );
    }
    for (i, job) in config.jobs.iter().enumerate() {
        let prefix = format!("jobs[{}].", i);
        collect_unknown(&prefix, &job.extra, &mut found);
        for step in job.steps() {
            collect_unknown(&format!("{}{}.", prefix, step.label()), &step.extra, &mut found);
        }
    }

    found
}

fn collect_unknown(prefix: &str, extra: &UnknownFields, found: &mut Vec<String>) {
    found.extend(extra.keys().map(|key| format!("{}{}", prefix, key)));
}

fn check_duplicates<'a>(
    kind: &str,
    names: impl Iterator<Item = &'a str>,
    errors: &mut Vec<String>,
) {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (i, name) in names.enumerate() {
        if name.is_empty() {
            continue;
        }
        if let Some(first) = seen.get(name) {
            errors.push(format!(
                "{kind}[{first}] and {kind}[{i}] have the same name ('{name}')"
            ));
        } else {
            seen.insert(name, i);
        }
    }
}

fn validate_resources(config: &PipelineConfig, errors: &mut Vec<String>) {
    for (i, resource) in config.resources.iter().enumerate() {
        if resource.name.is_empty() {
            errors.push(format!("resources[{}] has no name", i));
        }
        if resource.resource_type.is_empty() {
            errors.push(format!("resources[{}] has no type", i));
        }
    }

    for (i, resource_type) in config.resource_types.iter().enumerate() {
        if resource_type.name.is_empty() {
            errors.push(format!("resource_types[{}] has no name", i));
        }
        if resource_type.resource_type.is_empty() {
            errors.push(format!("resource_types[{}] has no type", i));
        }
    }
}

fn validate_groups(config: &PipelineConfig, errors: &mut Vec<String>) {
    let jobs: HashSet<&str> = config.jobs.iter().map(|j| j.name.as_str()).collect();
    let resources: HashSet<&str> = config.resources.iter().map(|r| r.name.as_str()).collect();

    for group in &config.groups {
        for job in &group.jobs {
            if !jobs.contains(job.as_str()) {
                errors.push(format!(
                    "group '{}' has unknown job '{}'",
                    group.name, job
                ));
            }
        }
        for resource in &group.resources {
            if !resources.contains(resource.as_str()) {
                errors.push(format!(
                    "group '{}' has unknown resource '{}'",
                    group.name, resource
                ));
            }
        }
    }
}

fn validate_jobs(
    config: &PipelineConfig,
    warnings: &mut Vec<ConfigWarning>,
    errors: &mut Vec<String>,
) {
    let resources: HashSet<&str> = config.resources.iter().map(|r| r.name.as_str()).collect();
    let job_resources: HashMap<&str, HashSet<&str>> = config
        .jobs
        .iter()
        .map(|job| (job.name.as_str(), job.resource_names().into_iter().collect()))
        .collect();

    for (i, job) in config.jobs.iter().enumerate() {
        if job.name.is_empty() {
            errors.push(format!("jobs[{}] has no name", i));
        }
        if job.plan.is_empty() {
            warnings.push(ConfigWarning::new(
                "pipeline",
                format!("job '{}' has an empty plan", job.name),
            ));
        }

        for step in job.steps() {
            if let Some(resource) = step.resource_name() {
                if !resources.contains(resource) {
                    errors.push(format!(
                        "job '{}': {} refers to a resource that does not exist ('{}')",
                        job.name,
                        step.label(),
                        resource
                    ));
                }

                for passed in &step.passed {
                    match job_resources.get(passed.as_str()) {
                        None => errors.push(format!(
                            "job '{}': {} has a passed constraint on unknown job '{}'",
                            job.name,
                            step.label(),
                            passed
                        )),
                        Some(used) if !used.contains(resource) => errors.push(format!(
                            "job '{}': {} has a passed constraint on job '{}' which does not use resource '{}'",
                            job.name,
                            step.label(),
                            passed,
                            resource
                        )),
                        Some(_) => {}
                    }
                }
            }

            if step.task.is_some() && step.file.is_none() && step.config.is_none() {
                errors.push(format!(
                    "job '{}': {} does not specify any task configuration",
                    job.name,
                    step.label()
                ));
            }
        }
    }

    let used: HashSet<&str> = job_resources.values().flatten().copied().collect();
    for resource in &config.resources {
        if !resource.name.is_empty() && !used.contains(resource.name.as_str()) {
            warnings.push(ConfigWarning::new(
                "pipeline",
                format!("resource '{}' is not used by any job", resource.name),
            ));
        }
    }
}
