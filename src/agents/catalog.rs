//! Static agent declarations
//!
//! Every agent in the graph is declared here: its wire-visible name, a
//! description (also used when the agent is exposed as a tool), the
//! instruction it runs under, the tools it may call and the session state key
//! its answer is stored under.

use crate::tools::agent_tool::{COMPANY_INFORMATION_TOOL, TRAINING_FINDER_TOOL};
use crate::tools::company_search::COMPANY_INFORMATION_SEARCH;
use crate::tools::employee::GET_EMPLOYEE_PROFILE;
use crate::tools::portfolio::GET_PROJECT_PORTFOLIO;
use crate::tools::search::WEB_SEARCH;
use crate::tools::training::{
    GET_EMPLOYEE_REMAINING_TRAINING_BUDGET, GET_EMPLOYEE_TRAINING_HISTORY, REGISTER_NEW_TRAINING,
};

/// Declaration of a single agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentDeclaration {
    pub name: &'static str,
    pub description: &'static str,
    pub instruction: &'static str,
    pub tools: &'static [&'static str],
    pub output_key: Option<&'static str>,
}

impl AgentDeclaration {
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.to_string()).collect()
    }
}

pub const INTENT_DETECTION: AgentDeclaration = AgentDeclaration {
    name: "IntentDetectionAgent",
    description: "Agent to detect the intent of the user's query.",
    instruction: r#"You classify requests sent to a professional development assistant.

Intents:
- SKILLS_DEVELOPMENT: the employee's current or future professional skills development needs, skill gaps, what to learn next
- TRAINING_HISTORY_AND_BUDGET: the employee's own training history or remaining training budget
- PROFESSIONAL_DEVELOPMENT_POLICY: questions about the company's professional development policy
- REGISTER_TRAINING: the user wants to register for a specific, already chosen training
- FIND_TRAINING: the user wants to find a new course, certification or workshop
- COMPANY_INFORMATION: the company's history, mission, values or other general information
- UNKNOWN: anything else

A user who wants to find a new course is FIND_TRAINING, never REGISTER_TRAINING.

Respond with ONLY the intent label, nothing else."#,
    tools: &[],
    output_key: Some("email"),
};

pub const SKILLS_DEVELOPMENT: AgentDeclaration = AgentDeclaration {
    name: "CurrentOrFutureSkillsDevelopmentAgent",
    description: "Detects employee current or future professional skills development needs based on the current skills and company information.",
    instruction: r#"You are a helpful agent who detects an employee's current and future professional skills development needs based on their current skills and the company's information.
Based on the employee email, call the 'get_employee_profile' tool to get the employee profile and current skills.
Get the company information by calling the 'company_information_tool' tool.
Get the project portfolio by calling the 'get_project_portfolio' tool.
Get the professional development company policy by calling the 'company_information_tool' tool. Your recommendations must align with the company policy.
If the user would like to find training opportunities, call the 'training_finder_tool' tool. Display each training's name, description, skills, date when it can be started, cost in USD and URL in a structured format, even if the training_finder_tool already returned them."#,
    tools: &[
        COMPANY_INFORMATION_TOOL,
        GET_EMPLOYEE_PROFILE,
        GET_PROJECT_PORTFOLIO,
        TRAINING_FINDER_TOOL,
    ],
    output_key: Some("current_skills_development_needs"),
};

pub const TRAINING_HISTORY_AND_BUDGET: AgentDeclaration = AgentDeclaration {
    name: "EmployeeTrainingHistoryAndRemainingTrainingBudgetAgent",
    description: "Describes and answers questions about the employee training history and remaining training budget.",
    instruction: r#"You are a helpful agent who describes and answers questions about an employee's training history and remaining training budget.
Use the 'get_employee_training_history' tool to get the actual employee training history.
Use the 'get_employee_remaining_training_budget' tool to get the actual employee remaining training budget.
Answer from the tool results only."#,
    tools: &[
        GET_EMPLOYEE_TRAINING_HISTORY,
        GET_EMPLOYEE_REMAINING_TRAINING_BUDGET,
    ],
    output_key: None,
};

pub const PROFESSIONAL_DEVELOPMENT_POLICY: AgentDeclaration = AgentDeclaration {
    name: "ProfessionalDevelopmentPolicyAgent",
    description: "Describes and answers questions about the employee professional development company policy.",
    instruction: r#"You are a helpful agent who describes and answers questions about the employee professional development company policy.
Use the 'company_information_tool' tool to get the actual professional development policy, then answer the question.
Make sure your recommendations align with the company policy."#,
    tools: &[COMPANY_INFORMATION_TOOL],
    output_key: None,
};

pub const TRAINING_FINDER: AgentDeclaration = AgentDeclaration {
    name: "TrainingFinderAgent",
    description: "Finds training opportunities for employees based on their current skills, company information, and project portfolio.",
    instruction: r#"You are a helpful agent who finds training opportunities for employees based on their current skills, company profile and project portfolio.
Use the 'web_search' tool to search the internet for training opportunities that align with the employee's current skills, desired future skills and company profile.
Display each training's name, description, skills, date when it can be started, cost in USD and URL."#,
    tools: &[WEB_SEARCH],
    output_key: Some("chosen_training"),
};

pub const TRAINING_REGISTERER: AgentDeclaration = AgentDeclaration {
    name: "TrainingRegistererAgent",
    description: "Registers new training opportunities for employees.",
    instruction: r#"You are a helpful agent who registers new training opportunities for employees.
You will be given a new training opportunity by the user, or find the chosen training in the session state under 'chosen_training'.
Use the 'register_new_training' tool to register the training for the employee. Dates use the YYYY-MM-DD format and costs are in USD.
Confirm what was registered."#,
    tools: &[REGISTER_NEW_TRAINING],
    output_key: None,
};

pub const COMPANY_INFORMATION: AgentDeclaration = AgentDeclaration {
    name: "CompanyInformationAgent",
    description: "Can answer questions about the company's information.",
    instruction: r#"You are a helpful agent who answers questions about the company's information, such as its history, mission and values.
You also answer questions about the company's professional development policy.
Use the 'company_information_search' tool and answer from the passages it returns."#,
    tools: &[COMPANY_INFORMATION_SEARCH],
    output_key: None,
};

/// The finder-then-registerer workflow; its tools are the sub-agents, in order.
pub const TRAINING_FINDER_AND_REGISTERER_WORKFLOW: AgentDeclaration = AgentDeclaration {
    name: "TrainingFinderAndRegistererWorkflowAgent",
    description: "Executes a sequence of training finding and registration.",
    instruction: "",
    tools: &[TRAINING_FINDER.name, TRAINING_REGISTERER.name],
    output_key: None,
};

/// LLM agents, in graph build order (leaves first).
pub const LLM_AGENTS: [AgentDeclaration; 6] = [
    COMPANY_INFORMATION,
    TRAINING_FINDER,
    TRAINING_REGISTERER,
    TRAINING_HISTORY_AND_BUDGET,
    PROFESSIONAL_DEVELOPMENT_POLICY,
    SKILLS_DEVELOPMENT,
];

/// Every declared agent: the entry point, the LLM agents and the workflow.
pub fn declarations() -> Vec<AgentDeclaration> {
    let mut all = vec![INTENT_DETECTION];
    all.extend(LLM_AGENTS);
    all.push(TRAINING_FINDER_AND_REGISTERER_WORKFLOW);
    all
}

/// Look a declaration up by agent name.
pub fn find(name: &str) -> Option<AgentDeclaration> {
    declarations().into_iter().find(|d| d.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_agent_names_are_unique() {
        let mut names: HashSet<&str> = LLM_AGENTS.iter().map(|d| d.name).collect();
        names.insert(INTENT_DETECTION.name);
        names.insert(TRAINING_FINDER_AND_REGISTERER_WORKFLOW.name);
        assert_eq!(names.len(), LLM_AGENTS.len() + 2);
    }

    #[test]
    fn test_find_declaration() {
        assert_eq!(declarations().len(), 8);
        assert_eq!(find("TrainingRegistererAgent"), Some(TRAINING_REGISTERER));
        assert_eq!(find("SalesAgent"), None);
    }

    #[test]
    fn test_skills_agent_tools() {
        assert_eq!(
            SKILLS_DEVELOPMENT.tool_names(),
            vec![
                "company_information_tool",
                "get_employee_profile",
                "get_project_portfolio",
                "training_finder_tool",
            ]
        );
        assert_eq!(
            SKILLS_DEVELOPMENT.output_key,
            Some("current_skills_development_needs")
        );
    }

    #[test]
    fn test_every_llm_agent_has_instruction() {
        for decl in LLM_AGENTS {
            assert!(!decl.instruction.is_empty(), "{} has no instruction", decl.name);
            assert!(!decl.tools.is_empty(), "{} has no tools", decl.name);
        }
    }
}
