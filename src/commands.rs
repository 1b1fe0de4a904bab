use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::dates::{date_status, format_day, DateStatus};
use crate::models::{
    CategoryPatch, CategoryWithCount, NewCategory, NewSubtask, NewTask, Priority, RecurrenceConfig, SubtaskPatch,
    Task, TaskPatch,
};
use crate::query::{sort_tasks, task_stats, FilterSet, SortBy};
use crate::recurrence::recurrence_preview;
use crate::service::TaskService;

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|n| Cell::new(n).add_attribute(Attribute::Bold))
        .collect()
}

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Medium => Color::Yellow,
        Priority::Low => Color::Green,
    }
}

fn due_cell(task: &Task, today: NaiveDate) -> Cell {
    let Some(due) = task.due_date else {
        return Cell::new("-");
    };
    let color = match date_status(task.due_date, today) {
        DateStatus::Overdue if !task.completed => Color::Red,
        DateStatus::Today if !task.completed => Color::Yellow,
        _ => Color::Reset,
    };
    Cell::new(format_day(due)).fg(color)
}

fn progress_text(task: &Task) -> String {
    match task.subtask_progress {
        Some(p) => format!("{}/{} ({}%)", p.completed, p.total, p.percentage),
        None => "-".to_string(),
    }
}

/// Renders tasks as a table, in the order given.
pub fn task_table(tasks: &[&Task], today: NaiveDate) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["ID", "Title", "Priority", "Category", "Due", "Subtasks", "Status"]));

    for t in tasks {
        let title = if t.is_recurring {
            format!("{} ↻", t.title)
        } else {
            t.title.clone()
        };
        let (status, status_color) = if t.completed {
            ("Done", Color::Green)
        } else if t.is_overdue(today) {
            ("Overdue", Color::Red)
        } else {
            ("Pending", Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(title),
            Cell::new(t.priority).fg(priority_color(t.priority)),
            Cell::new(&t.category),
            due_cell(t, today),
            Cell::new(progress_text(t)),
            Cell::new(status).fg(status_color),
        ]);
    }
    table
}

/// Renders categories with their task counts.
pub fn category_table(categories: &[CategoryWithCount]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(header(&["ID", "Name", "Color", "Tasks"]));
    for c in categories {
        table.add_row(vec![
            Cell::new(c.category.id),
            Cell::new(&c.category.name),
            Cell::new(&c.category.color),
            Cell::new(c.task_count),
        ]);
    }
    table
}

fn print_task(task: &Task, today: NaiveDate) {
    println!("{}", task_table(&[task], today));
    if !task.subtasks.is_empty() {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(header(&["#", "Subtask", "Done"]));
        for s in &task.subtasks {
            table.add_row(vec![
                Cell::new(s.id),
                Cell::new(&s.title),
                Cell::new(if s.completed { "x" } else { "" }),
            ]);
        }
        println!("{table}");
    }
}

/// Adds a new task.
pub async fn cmd_add(svc: &TaskService, data: NewTask) -> Result<()> {
    let task = svc.create_task(data).await?;
    println!("Task added (id = {})", task.id);
    Ok(())
}

/// Lists tasks matching `filters`.
///
/// Without a sort key the fixed display order is used.
pub async fn cmd_list(svc: &TaskService, filters: FilterSet, sort: Option<SortBy>, today: NaiveDate) -> Result<()> {
    let tasks = svc.filter_and_sort(&filters, today).await;
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }
    let mut view: Vec<&Task> = tasks.iter().collect();
    if let Some(sort_by) = sort {
        sort_tasks(&mut view, sort_by);
    }
    println!("{}", task_table(&view, today));

    let counts = svc.counts(today).await;
    println!(
        "{} shown | all {} | active {} | completed {} | overdue {} | today {}",
        view.len(),
        counts.all,
        counts.active,
        counts.completed,
        counts.overdue,
        counts.today
    );
    Ok(())
}

pub async fn cmd_show(svc: &TaskService, id: u64, today: NaiveDate) -> Result<()> {
    let task = svc.get_task(id).await?;
    print_task(&task, today);
    Ok(())
}

pub async fn cmd_edit(svc: &TaskService, id: u64, patch: TaskPatch) -> Result<()> {
    svc.update_task(id, patch).await?;
    println!("Task {id} updated.");
    Ok(())
}

/// Toggles a task between done and pending.
pub async fn cmd_done(svc: &TaskService, id: u64) -> Result<()> {
    let task = svc.toggle_task(id).await?;
    if task.completed {
        println!("Task {id} marked as complete.");
    } else {
        println!("Task {id} reopened.");
    }
    Ok(())
}

pub async fn cmd_remove(svc: &TaskService, id: u64) -> Result<()> {
    svc.delete_task(id).await?;
    println!("Task {id} removed.");
    Ok(())
}

/// Creates the tasks of a recurrence rule, or only describes them when `preview` is set.
pub async fn cmd_recur(svc: &TaskService, data: NewTask, config: RecurrenceConfig, preview: bool) -> Result<()> {
    println!("{}", recurrence_preview(&config));
    if preview {
        return Ok(());
    }
    let batch = svc.create_recurring_tasks(data, config).await?;
    if let (Some(first), Some(last)) = (batch.first(), batch.last()) {
        println!("Created {} recurring tasks (ids {} to {})", batch.len(), first.id, last.id);
    }
    Ok(())
}

pub async fn cmd_subtask_add(svc: &TaskService, task_id: u64, title: String) -> Result<()> {
    let task = svc.add_subtask(task_id, NewSubtask::titled(title)).await?;
    if let Some(s) = task.subtasks.last() {
        println!("Subtask {} added to task {task_id} ({})", s.id, progress_text(&task));
    }
    Ok(())
}

pub async fn cmd_subtask_edit(svc: &TaskService, task_id: u64, subtask_id: u64, patch: SubtaskPatch) -> Result<()> {
    let task = svc.update_subtask(task_id, subtask_id, patch).await?;
    println!("Subtask {subtask_id} updated ({})", progress_text(&task));
    Ok(())
}

pub async fn cmd_subtask_remove(svc: &TaskService, task_id: u64, subtask_id: u64) -> Result<()> {
    let task = svc.delete_subtask(task_id, subtask_id).await?;
    println!("Subtask {subtask_id} removed ({})", progress_text(&task));
    Ok(())
}

pub async fn cmd_subtask_toggle(svc: &TaskService, task_id: u64, subtask_id: u64) -> Result<()> {
    let task = svc.toggle_subtask(task_id, subtask_id).await?;
    println!("Task {task_id}: {}", progress_text(&task));
    Ok(())
}

pub async fn cmd_category_list(svc: &TaskService) -> Result<()> {
    let categories = svc.list_categories().await;
    if categories.is_empty() {
        println!("No categories found.");
        return Ok(());
    }
    println!("{}", category_table(&categories));
    Ok(())
}

pub async fn cmd_category_add(svc: &TaskService, data: NewCategory) -> Result<()> {
    let created = svc.create_category(data).await?;
    println!("Category '{}' added (id = {})", created.category.name, created.category.id);
    Ok(())
}

pub async fn cmd_category_edit(svc: &TaskService, id: u64, patch: CategoryPatch) -> Result<()> {
    svc.update_category(id, patch).await?;
    println!("Category {id} updated.");
    Ok(())
}

pub async fn cmd_category_remove(svc: &TaskService, id: u64) -> Result<()> {
    svc.delete_category(id).await?;
    println!("Category {id} removed.");
    Ok(())
}

pub async fn cmd_stats(svc: &TaskService, today: NaiveDate) -> Result<()> {
    let tasks = svc.list_tasks().await;
    let stats = task_stats(&tasks, today);
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(header(&["Metric", "Value"]));
    table.add_row(vec![Cell::new("Total"), Cell::new(stats.total)]);
    table.add_row(vec![Cell::new("Active"), Cell::new(stats.active)]);
    table.add_row(vec![Cell::new("Completed"), Cell::new(stats.completed)]);
    table.add_row(vec![Cell::new("Overdue"), Cell::new(stats.overdue)]);
    table.add_row(vec![Cell::new("Due today"), Cell::new(stats.due_today)]);
    table.add_row(vec![Cell::new("Completion"), Cell::new(format!("{}%", stats.completion_rate))]);
    println!("{table}");
    Ok(())
}
