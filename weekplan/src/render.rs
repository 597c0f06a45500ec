//! Plain-text rendering of plans, commitments and the daily overview.

use weekplan_core::dashboard::DashboardView;
use weekplan_core::time::DayBucket;
use weekplan_core::{CommitmentSchedule, ScheduleTask, Weekday, WeeklySchedule};

pub fn print_day(day: Weekday, tasks: &[ScheduleTask], verbose: u8) {
    println!("{}", day);
    if tasks.is_empty() {
        println!("  (nothing planned)");
        return;
    }
    for (index, task) in tasks.iter().enumerate() {
        print_task(index, task, verbose);
    }
}

pub fn print_week(schedule: &WeeklySchedule, verbose: u8) {
    for (i, (day, tasks)) in schedule.iter().enumerate() {
        if i > 0 {
            println!();
        }
        print_day(day, tasks, verbose);
    }
}

fn print_task(index: usize, task: &ScheduleTask, verbose: u8) {
    println!("  [{}] {:<21} {}", index, task.time, task.task);
    if verbose > 0 {
        if !task.description.is_empty() {
            println!("      {}", task.description);
        }
        if !task.reason.is_empty() {
            println!("      why: {}", task.reason);
        }
    }
}

pub fn print_commitments(commitments: &CommitmentSchedule) {
    if commitments.is_empty() {
        println!("No commitments");
        return;
    }
    for (day, events) in commitments.iter() {
        if events.is_empty() {
            continue;
        }
        println!("{}", day);
        for event in events {
            println!(
                "  {} {} - {} {} ({}, {})",
                event.id,
                event.start_time,
                event.end_time,
                event.title,
                event.kind.as_str(),
                event.recurrence.as_str()
            );
        }
    }
}

pub fn print_dashboard(view: &DashboardView, greeting: &str) {
    match view.day {
        Some(day) => println!("{}! Here is your {}.", greeting, day),
        None => println!("{}!", greeting),
    }

    if let Some(motivation) = &view.motivation {
        println!();
        println!("{}", motivation);
    }

    for bucket in [DayBucket::Morning, DayBucket::Afternoon, DayBucket::Evening] {
        let tasks = view.schedule.bucket(bucket);
        if tasks.is_empty() {
            continue;
        }
        println!();
        println!("{}", title_case(bucket.as_str()));
        for entry in tasks {
            println!("  [{}] {:<21} {}", entry.id, entry.task.time, entry.task.task);
        }
    }
    if !view.schedule.skipped.is_empty() {
        println!();
        println!("Unscheduled");
        for &index in &view.schedule.skipped {
            if let Some(task) = view.tasks.get(index) {
                println!("  [{}] {:<21} {}", index, task.time, task.task);
            }
        }
    }
    if view.tasks.is_empty() {
        println!();
        println!("Nothing planned today");
    }

    if let Some(challenge) = &view.challenge {
        println!();
        println!("Today's challenge: {}", challenge);
    }

    if !view.upcoming.is_empty() {
        println!();
        println!("Coming up tomorrow");
        for task in &view.upcoming {
            println!("  {:<21} {}", task.time, task.task);
        }
    }

    if let Some(quote) = &view.quote {
        println!();
        println!("\"{}\"", quote);
    }
    if let Some(tip) = &view.tip {
        println!("Tip: {}", tip);
    }

    print_goals("This week", &view.weekly_goals);
    print_goals("This month", &view.monthly_goals);

    if !view.learning_resources.is_empty() {
        println!();
        println!("Learning resources");
        for resource in &view.learning_resources {
            println!("  - {}", resource.title);
            if !resource.description.is_empty() {
                println!("    {}", resource.description);
            }
            if !resource.url.is_empty() {
                println!("    {}", resource.url);
            }
        }
    }

    let energy = &view.energy_insights;
    let energy_lines = [
        ("Peak hours", &energy.peak_hours),
        ("Rest periods", &energy.rest_periods),
        ("Optimizations", &energy.optimizations),
    ];
    if energy_lines.iter().any(|(_, text)| !text.is_empty()) {
        println!();
        println!("Energy");
        for (label, text) in energy_lines.iter().filter(|(_, text)| !text.is_empty()) {
            println!("  {}: {}", label, text);
        }
    }

    let metrics = &view.progress_metrics;
    print_goals("Focus areas", &metrics.focus_areas);
    print_goals("Milestones", &metrics.key_milestones);
    print_goals("Signs of progress", &metrics.success_indicators);
}

fn print_goals(heading: &str, goals: &[String]) {
    if goals.is_empty() {
        return;
    }
    println!();
    println!("{}", heading);
    for goal in goals {
        println!("  - {}", goal);
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
