use std::collections::BTreeSet;

use serde::Serialize;

use super::Agent;

/// Agents in `country`, case-insensitively. `None`, blank, or `all` keep everyone.
pub fn filter_by_country<'a>(agents: &'a [Agent], country: Option<&str>) -> Vec<&'a Agent> {
    match country.map(str::trim) {
        None | Some("") => agents.iter().collect(),
        Some(country) if country.eq_ignore_ascii_case("all") => agents.iter().collect(),
        Some(country) => agents
            .iter()
            .filter(|agent| agent.country.eq_ignore_ascii_case(country))
            .collect(),
    }
}

/// Case-insensitive substring match over name, contact, and address.
pub fn search<'a>(agents: &'a [Agent], term: &str) -> Vec<&'a Agent> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return agents.iter().collect();
    }

    agents
        .iter()
        .filter(|agent| {
            [&agent.name, &agent.contact, &agent.address]
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentOption {
    pub value: String,
    pub label: String,
}

/// Select options keyed `name|country`; nameless agents are dropped.
pub fn format_for_select(agents: &[Agent]) -> Vec<AgentOption> {
    agents
        .iter()
        .filter(|agent| !agent.name.trim().is_empty())
        .map(|agent| AgentOption {
            value: format!("{}|{}", agent.name, agent.country),
            label: agent.name.clone(),
        })
        .collect()
}

/// Sorted, de-duplicated, non-blank countries.
pub fn countries(agents: &[Agent]) -> Vec<String> {
    agents
        .iter()
        .map(|agent| agent.country.clone())
        .filter(|country| !country.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Reverse lookup of a `name|country` key.
pub fn find_by_value<'a>(agents: &'a [Agent], value: &str) -> Option<&'a Agent> {
    let (name, country) = value.split_once('|')?;
    agents
        .iter()
        .find(|agent| agent.name == name && agent.country == country)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionCheck {
    pub is_valid: bool,
    pub message: String,
}

pub fn validate_selection(value: Option<&str>) -> SelectionCheck {
    let invalid = |message: &str| SelectionCheck {
        is_valid: false,
        message: message.to_string(),
    };

    let Some(value) = value.filter(|value| !value.is_empty()) else {
        return invalid("Please select an agent");
    };

    match value.split_once('|') {
        Some((name, country)) if !name.is_empty() && !country.is_empty() => SelectionCheck {
            is_valid: true,
            message: String::new(),
        },
        _ => invalid("Invalid agent selection format"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentDisplayInfo {
    pub name: String,
    pub contact: String,
    pub country: String,
    pub address: String,
    pub email: String,
    pub phone: String,
    pub website: String,
}

/// Review-screen summary using the first email, phone, and website.
pub fn display_info(agent: &Agent) -> AgentDisplayInfo {
    let first = |values: &[String]| values.first().cloned().unwrap_or_default();
    AgentDisplayInfo {
        name: agent.name.clone(),
        contact: agent.contact.clone(),
        country: agent.country.clone(),
        address: agent.address.clone(),
        email: first(&agent.emails),
        phone: first(&agent.phones),
        website: first(&agent.websites),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agents() -> Vec<Agent> {
        vec![
            Agent {
                name: "Acme Education".to_string(),
                contact: "Priya Shah".to_string(),
                country: "India".to_string(),
                address: "12 MG Road, Bengaluru".to_string(),
                emails: vec!["priya@acme.example".to_string()],
                ..Agent::default()
            },
            Agent {
                name: "Borealis Study".to_string(),
                contact: "Lars Berg".to_string(),
                country: "Norway".to_string(),
                address: "Karl Johans gate 1, Oslo".to_string(),
                ..Agent::default()
            },
            Agent {
                name: "  ".to_string(),
                country: "india".to_string(),
                ..Agent::default()
            },
        ]
    }

    #[test]
    fn filters_and_searches() {
        let agents = agents();
        assert_eq!(filter_by_country(&agents, Some("INDIA")).len(), 2);
        assert_eq!(filter_by_country(&agents, Some("all")).len(), 3);
        assert_eq!(filter_by_country(&agents, None).len(), 3);

        let hits = search(&agents, "oslo");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Borealis Study");
        assert_eq!(search(&agents, "priya")[0].name, "Acme Education");
        assert_eq!(search(&agents, "  ").len(), 3);
    }

    #[test]
    fn select_options_round_trip_through_lookup() {
        let agents = agents();
        let options = format_for_select(&agents);
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].value, "Acme Education|India");

        let found = find_by_value(&agents, &options[1].value).expect("agent found");
        assert_eq!(found.contact, "Lars Berg");
        assert!(find_by_value(&agents, "Acme Education").is_none());
    }

    #[test]
    fn countries_are_sorted_and_unique() {
        let mut agents = agents();
        agents.push(Agent {
            name: "Copy".to_string(),
            country: "India".to_string(),
            ..Agent::default()
        });
        assert_eq!(countries(&agents), vec!["India", "Norway", "india"]);
    }

    #[test]
    fn selection_validation_messages() {
        assert_eq!(validate_selection(None).message, "Please select an agent");
        assert_eq!(
            validate_selection(Some("Acme")).message,
            "Invalid agent selection format"
        );
        assert!(validate_selection(Some("Acme|India")).is_valid);
    }

    #[test]
    fn display_info_takes_first_contact_points() {
        let agents = agents();
        let info = display_info(&agents[0]);
        assert_eq!(info.email, "priya@acme.example");
        assert_eq!(info.phone, "");
    }
}
