// src/behavior/simple.rs

//! Default task behavior: AND-join readiness, repeat-aware evaluation and
//! typed-link propagation.

use tracing::{debug, error};

use crate::behavior::repeat::{RepeatData, RepeatHandler, RepeatKind};
use crate::behavior::{TaskBehavior, TaskContext};
use crate::errors::{ActivityError, FlowError, Result};
use crate::model::{
    EnterResult, EvalResult, FaultRouting, LinkInstance, LinkStatus, LinkType, Propagation,
    TaskEntry, TaskStatus,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleTaskBehavior;

impl SimpleTaskBehavior {
    pub fn new() -> Self {
        Self
    }

    /// Shared error branch of `eval` and `post_eval`.
    fn handle_activity_error(
        &self,
        ctx: &mut dyn TaskContext,
        repeats: &mut dyn RepeatHandler,
        err: ActivityError,
        phase: &str,
    ) -> EvalResult {
        if err.is_retriable() {
            match repeats.repeat_data(&*ctx, RepeatKind::OnError) {
                Err(lookup) => {
                    error!(
                        task = %ctx.task().name,
                        error = %err,
                        lookup_error = %lookup,
                        "repeat policy lookup failed after activity error"
                    );
                    return fail(ctx, lookup);
                }
                Ok(data) if data.count > 0 => {
                    return self.repeat(ctx, repeats, &data, RepeatKind::OnError);
                }
                Ok(_) => {}
            }
        }

        let task = ctx.task();
        error!(
            task = %task.name,
            cmd = %task.activity.cmd,
            error = %err,
            "error {} activity",
            phase
        );
        let err = FlowError::Activity {
            task: task.name.clone(),
            source: err,
        };
        fail(ctx, err)
    }

    fn repeat(
        &self,
        ctx: &mut dyn TaskContext,
        repeats: &mut dyn RepeatHandler,
        data: &RepeatData,
        kind: RepeatKind,
    ) -> EvalResult {
        match repeats.do_repeat(ctx, data, kind) {
            Ok(EvalResult::Fail(err)) | Err(err) => fail(ctx, err),
            Ok(result) => result,
        }
    }

    /// Success path shared by `eval` and `post_eval`.
    fn check_condition_repeat(
        &self,
        ctx: &mut dyn TaskContext,
        repeats: &mut dyn RepeatHandler,
    ) -> EvalResult {
        match repeats.repeat_data(&*ctx, RepeatKind::OnCondition) {
            Err(lookup) => fail(ctx, lookup),
            Ok(data) if data.has_condition() => match repeats.evaluate_expression(ctx, &data) {
                Ok(EvalResult::Fail(err)) | Err(err) => fail(ctx, err),
                Ok(result) => result,
            },
            Ok(_) => EvalResult::Done,
        }
    }
}

fn fail(ctx: &mut dyn TaskContext, err: FlowError) -> EvalResult {
    ctx.set_status(TaskStatus::Failed);
    EvalResult::Fail(err)
}

fn entry_for(inst: &LinkInstance) -> TaskEntry {
    TaskEntry::new(inst.link.to.clone())
}

impl TaskBehavior for SimpleTaskBehavior {
    fn enter(&self, ctx: &mut dyn TaskContext) -> EnterResult {
        let name = ctx.task().name.clone();
        debug!(task = %name, "enter task");

        ctx.set_status(TaskStatus::Entered);

        let links = ctx.from_link_instances();

        // A task without predecessors is always ready.
        let mut skip_candidate = false;

        if !links.is_empty() {
            debug!(task = %name, incoming = links.len(), "task has incoming links");
            skip_candidate = true;

            for inst in &links {
                debug!(
                    task = %name,
                    from = %inst.link.from,
                    status = %inst.status,
                    "incoming link"
                );
                match inst.status {
                    LinkStatus::Pending => {
                        debug!(task = %name, "task not ready");
                        return EnterResult::NotReady;
                    }
                    LinkStatus::True => skip_candidate = false,
                    LinkStatus::False | LinkStatus::Skipped => {}
                }
            }
        }

        if skip_candidate {
            debug!(task = %name, "no incoming link resolved true; skipping task");
            ctx.set_status(TaskStatus::Skipped);
            EnterResult::Skip
        } else {
            debug!(task = %name, "task ready");
            ctx.set_status(TaskStatus::Ready);
            EnterResult::Eval
        }
    }

    fn eval(&self, ctx: &mut dyn TaskContext, repeats: &mut dyn RepeatHandler) -> EvalResult {
        if ctx.status() == TaskStatus::Skipped {
            return EvalResult::Skip;
        }

        debug!(task = %ctx.task().name, "eval task");

        match ctx.eval_activity() {
            Err(err) => self.handle_activity_error(ctx, repeats, err, "evaluating"),
            Ok(true) => self.check_condition_repeat(ctx, repeats),
            Ok(false) => EvalResult::Wait,
        }
    }

    fn post_eval(&self, ctx: &mut dyn TaskContext, repeats: &mut dyn RepeatHandler) -> EvalResult {
        debug!(task = %ctx.task().name, "post eval task");

        match ctx.post_eval_activity() {
            Err(err) => self.handle_activity_error(ctx, repeats, err, "post evaluating"),
            Ok(()) => self.check_condition_repeat(ctx, repeats),
        }
    }

    fn done(&self, ctx: &mut dyn TaskContext) -> Result<Propagation> {
        let links = ctx.to_link_instances();
        let name = ctx.task().name.clone();

        ctx.set_status(TaskStatus::Done);
        debug!(task = %name, "task is done");

        if links.is_empty() {
            debug!(task = %name, "notifying flow that end task is done");
            return Ok(Propagation::terminal());
        }

        debug!(task = %name, outgoing = links.len(), "processing outgoing links");

        let mut entries = Vec::with_capacity(links.len());
        let mut followed_any = false;
        let mut otherwise: Option<LinkInstance> = None;

        for inst in links {
            let follow = match inst.link_type() {
                // Reserved for fault routing.
                LinkType::Error => continue,
                LinkType::Otherwise => {
                    otherwise = Some(inst);
                    continue;
                }
                LinkType::Expression => {
                    debug!(
                        task = %name,
                        link = %inst.id(),
                        to = %inst.link.to,
                        "evaluating outgoing expression link"
                    );
                    ctx.eval_link(&inst.link)?
                }
                LinkType::Normal => true,
            };

            if follow {
                followed_any = true;
                ctx.set_link_status(inst.id(), LinkStatus::True);
                debug!(task = %name, to = %inst.link.to, "following link");
            } else {
                ctx.set_link_status(inst.id(), LinkStatus::False);
            }

            // Unfollowed links still produce an entry so the target's join
            // observes the resolution.
            entries.push(entry_for(&inst));
        }

        if !followed_any {
            if let Some(inst) = otherwise {
                ctx.set_link_status(inst.id(), LinkStatus::True);
                debug!(task = %name, to = %inst.link.to, "following otherwise link");
                entries.push(entry_for(&inst));
            }
        }

        Ok(Propagation::continue_with(entries))
    }

    fn skip(&self, ctx: &mut dyn TaskContext) -> Propagation {
        let links = ctx.to_link_instances();
        let name = ctx.task().name.clone();

        ctx.set_status(TaskStatus::Skipped);
        debug!(task = %name, "task was skipped");

        if links.is_empty() {
            debug!(task = %name, "notifying flow that end task is skipped");
            return Propagation::terminal();
        }

        debug!(task = %name, outgoing = links.len(), "skipping outgoing links");

        let mut entries = Vec::with_capacity(links.len());
        for inst in &links {
            ctx.set_link_status(inst.id(), LinkStatus::Skipped);
            entries.push(entry_for(inst));
        }

        Propagation::continue_with(entries)
    }

    fn error(&self, ctx: &mut dyn TaskContext, err: &FlowError) -> FaultRouting {
        let links = ctx.to_link_instances();
        let name = ctx.task().name.clone();

        let handled = links
            .iter()
            .any(|inst| inst.link_type() == LinkType::Error);

        if !handled {
            debug!(task = %name, error = %err, "no error link; fault not handled locally");
            return FaultRouting::unhandled();
        }

        debug!(task = %name, error = %err, "routing fault to error links");

        let mut entries = Vec::with_capacity(links.len());
        for inst in &links {
            let status = match inst.link_type() {
                LinkType::Error => LinkStatus::True,
                LinkType::Normal | LinkType::Expression | LinkType::Otherwise => LinkStatus::False,
            };
            ctx.set_link_status(inst.id(), status);
            entries.push(entry_for(inst));
        }

        FaultRouting {
            handled: true,
            entries,
        }
    }
}
