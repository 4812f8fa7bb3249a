//! Agent Registry
//!
//! Builds the agent graph from the static declarations and looks agents up
//! by their wire-visible names.
//!
//! ## Graph
//!
//! ```text
//! IntentDetectionAgent
//! ├── CurrentOrFutureSkillsDevelopmentAgent
//! │     ├── company_information_tool ──> CompanyInformationAgent
//! │     └── training_finder_tool ──────> TrainingFinderAgent
//! ├── EmployeeTrainingHistoryAndRemainingTrainingBudgetAgent
//! ├── ProfessionalDevelopmentPolicyAgent
//! │     └── company_information_tool ──> CompanyInformationAgent
//! ├── TrainingFinderAgent
//! ├── TrainingRegistererAgent
//! └── CompanyInformationAgent
//!
//! TrainingFinderAndRegistererWorkflowAgent = TrainingFinderAgent, then TrainingRegistererAgent
//! ```

use crate::agents::catalog::{self, AgentDeclaration};
use crate::agents::configurable::ConfigurableAgent;
use crate::agents::router::{IntentClassifier, IntentRouter, LlmIntentClassifier};
use crate::agents::workflow::SequentialAgent;
use crate::agents::Agent;
use crate::llm::coordinator::ToolCallingConfig;
use crate::llm::LLMClient;
use crate::tools::agent_tool::{AgentTool, COMPANY_INFORMATION_TOOL, TRAINING_FINDER_TOOL};
use crate::tools::registry::ToolRegistry;
use crate::types::{AppError, Intent, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

/// Public description of one agent
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgentInfo {
    pub name: String,
    pub description: String,
    /// Tools, agent tools or sub-agents this agent can call
    pub tools: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_key: Option<String>,
}

/// Registry of every agent in the graph, keyed by name
pub struct AgentRegistry {
    agents: HashMap<String, Arc<dyn Agent>>,
    router: Arc<IntentRouter>,
}

impl AgentRegistry {
    /// Build the graph with the LLM-backed intent classifier.
    pub fn build(
        llm: Arc<dyn LLMClient>,
        tools: &ToolRegistry,
        tool_config: ToolCallingConfig,
    ) -> Self {
        let classifier = Arc::new(LlmIntentClassifier::new(llm.clone()));
        Self::with_classifier(llm, tools, tool_config, classifier)
    }

    /// Build the graph with a custom intent classifier.
    ///
    /// `tools` must hold the domain tools; each agent receives only the ones
    /// it declares, plus its agent tools.
    pub fn with_classifier(
        llm: Arc<dyn LLMClient>,
        tools: &ToolRegistry,
        tool_config: ToolCallingConfig,
        classifier: Arc<dyn IntentClassifier>,
    ) -> Self {
        let llm_agent = |declaration: AgentDeclaration, agent_tools: Vec<AgentTool>| {
            let mut registry = tools.subset(declaration.tools);
            for tool in agent_tools {
                registry.register(Arc::new(tool));
            }
            Arc::new(ConfigurableAgent::new(
                declaration,
                llm.clone(),
                Arc::new(registry),
                tool_config.clone(),
            )) as Arc<dyn Agent>
        };

        let company = llm_agent(catalog::COMPANY_INFORMATION, Vec::new());
        let finder = llm_agent(catalog::TRAINING_FINDER, Vec::new());
        let registerer = llm_agent(catalog::TRAINING_REGISTERER, Vec::new());
        let history = llm_agent(catalog::TRAINING_HISTORY_AND_BUDGET, Vec::new());
        let policy = llm_agent(
            catalog::PROFESSIONAL_DEVELOPMENT_POLICY,
            vec![AgentTool::new(COMPANY_INFORMATION_TOOL, company.clone())],
        );
        let skills = llm_agent(
            catalog::SKILLS_DEVELOPMENT,
            vec![
                AgentTool::new(COMPANY_INFORMATION_TOOL, company.clone()),
                AgentTool::new(TRAINING_FINDER_TOOL, finder.clone()),
            ],
        );
        let workflow: Arc<dyn Agent> = Arc::new(SequentialAgent::from_declaration(
            &catalog::TRAINING_FINDER_AND_REGISTERER_WORKFLOW,
            vec![finder.clone(), registerer.clone()],
        ));

        let router = Arc::new(
            IntentRouter::new(classifier)
                .with_route(Intent::SkillsDevelopment, skills.clone())
                .with_route(Intent::TrainingHistoryAndBudget, history.clone())
                .with_route(Intent::ProfessionalDevelopmentPolicy, policy.clone())
                .with_route(Intent::RegisterTraining, registerer.clone())
                .with_route(Intent::FindTraining, finder.clone())
                .with_route(Intent::CompanyInformation, company.clone()),
        );

        let mut agents: HashMap<String, Arc<dyn Agent>> = HashMap::new();
        for agent in [
            company,
            finder,
            registerer,
            history,
            policy,
            skills,
            workflow,
            router.clone() as Arc<dyn Agent>,
        ] {
            agents.insert(agent.name().to_string(), agent);
        }

        info!(agents = agents.len(), "Agent graph built");

        Self { agents, router }
    }

    /// The intent detection entry point
    pub fn router(&self) -> Arc<IntentRouter> {
        self.router.clone()
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Agent>> {
        self.agents
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Agent not found: {}", name)))
    }

    pub fn has_agent(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// All agent names, sorted
    pub fn agent_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.agents.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn descriptors(&self) -> Vec<AgentInfo> {
        self.agent_names()
            .into_iter()
            .filter_map(|name| self.agents.get(&name))
            .map(|agent| AgentInfo {
                name: agent.name().to_string(),
                description: agent.description().to_string(),
                tools: agent.tool_names(),
                output_key: agent.output_key().map(str::to_string),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
